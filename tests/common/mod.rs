/*!
 * Common test utilities for the gdtrans test suite
 */

use std::sync::Once;

use gdtrans::app_config::Config;


static INIT_LOGGING: Once = Once::new();

/// Initializes test logging once per process
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Creates a configuration suitable for offline tests
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.api_key = "test-key".to_string();
    config.target_lang = "zh".to_string();
    config
}
