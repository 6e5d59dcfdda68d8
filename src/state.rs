use crate::backend::Backend;
use crate::config::AppConfig;

pub struct AppState {
    pub backend: Box<dyn Backend>,
    pub config: AppConfig,
}
