use std::sync::Arc;

use storefront_core::repositories::MenuRepository;
use storefront_core::services::NavigationService;
use storefront_shared::config::AppConfig;

pub type SharedNavigationService = Arc<NavigationService<dyn MenuRepository>>;

#[derive(Clone)]
pub struct AppState {
    pub navigation: SharedNavigationService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(menu_repo: Arc<dyn MenuRepository>, config: AppConfig) -> Self {
        let navigation = NavigationService::new(menu_repo, config.navigation.depth_limit());
        Self {
            navigation: Arc::new(navigation),
            config,
        }
    }
}
