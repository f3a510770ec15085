// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 用户提示文案为印尼语（产品面向印尼小型甜甜圈作坊）
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（默认 "id"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use hpp_donat::i18n::t_with_args;
/// let msg = t_with_args("status.save_failed", &[("reason", "disk I/O error")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(t("status.ready"), "Siap digunakan.");
        assert_eq!(t("status.saving"), "Menyimpan perubahan...");
        assert_eq!(t("status.saved"), "Semua perubahan tersimpan.");
    }

    #[test]
    fn test_translate_with_args() {
        let msg = t_with_args("status.save_failed", &[("reason", "database is locked")]);
        assert!(msg.contains("Gagal menyimpan"));
        assert!(msg.contains("database is locked"));
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(t("validation.ok"), "OK");
        assert_eq!(t("validation.netto_invalid"), "Netto per pack harus > 0");
    }
}
