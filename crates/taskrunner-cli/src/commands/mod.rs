pub mod add;
pub mod check;
pub mod config;
pub mod delete;
pub mod list;
pub mod run;
pub mod search;
pub mod show;
pub mod stats;

pub use add::run as add;
pub use check::run as check;
pub use config::run as config;
pub use delete::run as delete;
pub use list::run as list;
pub use run::run;
pub use search::run as search;
pub use show::run as show;
pub use stats::run as stats;
