//! Constants the engine defines without any declaration in user code.

use super::value::Value;
use crate::reflector::ReflectorConfig;

const INT_CONSTANTS: &[(&str, i64)] = &[
    ("PHP_INT_MAX", i64::MAX),
    ("PHP_INT_MIN", i64::MIN),
    ("PHP_INT_SIZE", 8),
    ("PHP_FLOAT_DIG", 15),
    ("PHP_MAXPATHLEN", 4096),
    ("PHP_DEBUG", 0),
    ("PHP_ZTS", 0),
    ("E_ERROR", 1),
    ("E_WARNING", 2),
    ("E_PARSE", 4),
    ("E_NOTICE", 8),
    ("E_CORE_ERROR", 16),
    ("E_CORE_WARNING", 32),
    ("E_COMPILE_ERROR", 64),
    ("E_COMPILE_WARNING", 128),
    ("E_USER_ERROR", 256),
    ("E_USER_WARNING", 512),
    ("E_USER_NOTICE", 1024),
    ("E_STRICT", 2048),
    ("E_RECOVERABLE_ERROR", 4096),
    ("E_DEPRECATED", 8192),
    ("E_USER_DEPRECATED", 16384),
    ("E_ALL", 32767),
    ("COUNT_NORMAL", 0),
    ("COUNT_RECURSIVE", 1),
    ("SORT_REGULAR", 0),
    ("SORT_NUMERIC", 1),
    ("SORT_STRING", 2),
    ("SORT_LOCALE_STRING", 5),
    ("SORT_NATURAL", 6),
    ("SORT_FLAG_CASE", 8),
    ("SORT_ASC", 4),
    ("SORT_DESC", 3),
    ("ARRAY_FILTER_USE_KEY", 2),
    ("ARRAY_FILTER_USE_BOTH", 1),
    ("PHP_ROUND_HALF_UP", 1),
    ("PHP_ROUND_HALF_DOWN", 2),
    ("PHP_ROUND_HALF_EVEN", 3),
    ("PHP_ROUND_HALF_ODD", 4),
    ("ENT_COMPAT", 2),
    ("ENT_QUOTES", 3),
    ("ENT_NOQUOTES", 0),
    ("ENT_HTML401", 0),
    ("ENT_SUBSTITUTE", 8),
    ("ENT_HTML5", 48),
    ("JSON_HEX_TAG", 1),
    ("JSON_HEX_AMP", 2),
    ("JSON_HEX_APOS", 4),
    ("JSON_HEX_QUOT", 8),
    ("JSON_FORCE_OBJECT", 16),
    ("JSON_NUMERIC_CHECK", 32),
    ("JSON_UNESCAPED_SLASHES", 64),
    ("JSON_PRETTY_PRINT", 128),
    ("JSON_UNESCAPED_UNICODE", 256),
    ("JSON_PARTIAL_OUTPUT_ON_ERROR", 512),
    ("JSON_PRESERVE_ZERO_FRACTION", 1024),
    ("JSON_OBJECT_AS_ARRAY", 1),
    ("JSON_BIGINT_AS_STRING", 2),
    ("JSON_INVALID_UTF8_IGNORE", 1048576),
    ("JSON_INVALID_UTF8_SUBSTITUTE", 2097152),
    ("JSON_THROW_ON_ERROR", 4194304),
    ("LC_CTYPE", 0),
    ("LC_NUMERIC", 1),
    ("LC_TIME", 2),
    ("LC_COLLATE", 3),
    ("LC_MONETARY", 4),
    ("LC_ALL", 6),
    ("STR_PAD_RIGHT", 1),
    ("STR_PAD_LEFT", 0),
    ("STR_PAD_BOTH", 2),
    ("PREG_PATTERN_ORDER", 1),
    ("PREG_SET_ORDER", 2),
    ("PREG_OFFSET_CAPTURE", 256),
    ("PREG_SPLIT_NO_EMPTY", 1),
    ("PREG_SPLIT_DELIM_CAPTURE", 2),
];

const FLOAT_CONSTANTS: &[(&str, f64)] = &[
    ("PHP_FLOAT_EPSILON", f64::EPSILON),
    ("PHP_FLOAT_MAX", f64::MAX),
    ("PHP_FLOAT_MIN", f64::MIN_POSITIVE),
    ("INF", f64::INFINITY),
    ("NAN", f64::NAN),
    ("M_PI", std::f64::consts::PI),
    ("M_E", std::f64::consts::E),
    ("M_LOG2E", std::f64::consts::LOG2_E),
    ("M_LOG10E", std::f64::consts::LOG10_E),
    ("M_LN2", std::f64::consts::LN_2),
    ("M_LN10", std::f64::consts::LN_10),
    ("M_PI_2", std::f64::consts::FRAC_PI_2),
    ("M_PI_4", std::f64::consts::FRAC_PI_4),
    ("M_1_PI", std::f64::consts::FRAC_1_PI),
    ("M_2_PI", std::f64::consts::FRAC_2_PI),
    ("M_2_SQRTPI", std::f64::consts::FRAC_2_SQRT_PI),
    ("M_SQRT2", std::f64::consts::SQRT_2),
    ("M_SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
];

const STRING_CONSTANTS: &[(&str, &str)] = &[
    ("PHP_EOL", "\n"),
    ("PHP_OS", "Linux"),
    ("PHP_OS_FAMILY", "Linux"),
    ("DIRECTORY_SEPARATOR", "/"),
    ("PATH_SEPARATOR", ":"),
    ("PHP_EXTRA_VERSION", ""),
    ("PHP_SHLIB_SUFFIX", "so"),
];

/// Value of an engine-intrinsic constant. Names are case-sensitive.
pub fn intrinsic_constant(name: &str, config: &ReflectorConfig) -> Option<Value> {
    let name = name.trim_start_matches('\\');
    match name {
        "PHP_VERSION" => return Some(Value::String(config.version_string())),
        "PHP_VERSION_ID" => return Some(Value::Int(i64::from(config.php_version_id))),
        "PHP_MAJOR_VERSION" => return Some(Value::Int(i64::from(config.major()))),
        "PHP_MINOR_VERSION" => return Some(Value::Int(i64::from(config.minor()))),
        "PHP_RELEASE_VERSION" => return Some(Value::Int(i64::from(config.release()))),
        _ => {}
    }
    if let Some((_, value)) = INT_CONSTANTS.iter().find(|(n, _)| *n == name) {
        return Some(Value::Int(*value));
    }
    if let Some((_, value)) = FLOAT_CONSTANTS.iter().find(|(n, _)| *n == name) {
        return Some(Value::Float(*value));
    }
    STRING_CONSTANTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, value)| Value::String(value.to_string()))
}
