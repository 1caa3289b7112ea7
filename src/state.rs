use crate::config::AppConfig;
use crate::db::Db;
use crate::models::TenantConfig;
use crate::services::calendar::CalendarProvider;
use crate::services::composer::PhrasePicker;

pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub calendar: Box<dyn CalendarProvider>,
    pub phrases: Box<dyn PhrasePicker>,
    /// Applied to turns that carry no usable tenant configuration.
    pub default_tenant: TenantConfig,
}
