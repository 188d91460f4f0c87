pub mod admin;
pub mod category;
pub mod flash;
pub mod links;
pub mod thread;

/// Configures the web app by adding services from each web file.
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Route resolution stops at the first match; admin before the
    // public catch-alls.
    admin::configure(conf);
    category::configure(conf);
    thread::configure(conf);
}
