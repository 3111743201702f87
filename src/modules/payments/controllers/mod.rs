pub mod callback_controller;
pub mod payment_controller;

use actix_web::web;

/// Configure payment and callback routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    callback_controller::configure(cfg);
    payment_controller::configure(cfg);
}
