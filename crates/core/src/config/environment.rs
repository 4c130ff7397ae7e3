use std::env;

/// 读取布尔型环境变量：支持 true/false/1/0（大小写不敏感）
pub fn env_is_true(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => {
            let v = v.trim();
            v.eq_ignore_ascii_case("true") || v == "1"
        }
        Err(_) => default,
    }
}

/// 读取字符串环境变量，若不存在则返回默认值
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) => v,
        Err(_) => default.to_string(),
    }
}

/// 读取可选字符串环境变量，空字符串视为未设置
pub fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// 读取 u64 环境变量，不存在或解析失败返回默认值
pub fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_defaults() {
        assert!(env_is_true("QU_TEST_SURELY_UNSET_FLAG", true));
        assert_eq!(env_u64("QU_TEST_SURELY_UNSET_NUM", 7), 7);
        assert_eq!(env_or_default("QU_TEST_SURELY_UNSET_STR", "x"), "x");
        assert_eq!(env_opt("QU_TEST_SURELY_UNSET_STR"), None);
    }

    #[test]
    fn test_env_values() {
        env::set_var("QU_TEST_FLAG", " TRUE ");
        env::set_var("QU_TEST_NUM", "42");
        env::set_var("QU_TEST_BAD_NUM", "4x");
        assert!(env_is_true("QU_TEST_FLAG", false));
        assert_eq!(env_u64("QU_TEST_NUM", 0), 42);
        assert_eq!(env_u64("QU_TEST_BAD_NUM", 3), 3);
    }
}
