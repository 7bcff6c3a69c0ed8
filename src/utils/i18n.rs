use tracing::warn;

/// Locales shipped in `locales/`
const AVAILABLE_LOCALES: &[&str] = &["en"];

/// Switch the locale used by `t!`, falling back to English for unknown locales
pub fn set_locale(locale: &str) {
    if AVAILABLE_LOCALES.contains(&locale) {
        rust_i18n::set_locale(locale);
    } else {
        warn!("Unknown locale {}, falling back to en", locale);
        rust_i18n::set_locale("en");
    }
}
