pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;

use config::Config;
use services::mail::MailService;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub mailer: Option<MailService>,
}
