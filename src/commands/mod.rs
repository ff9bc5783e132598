mod list;
mod start;
mod stop;

pub use list::run_list;
pub use start::run_start;
pub use stop::run_stop;
