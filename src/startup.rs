use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::TokenService;
use crate::logger::LoggerMiddleware;
use crate::routes::{health_check, issue_tokens, refresh_tokens};

pub fn run(listener: TcpListener, token_service: TokenService) -> Result<Server, std::io::Error> {
    let token_service = web::Data::new(token_service);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(token_service.clone())
            .route("/health_check", web::get().to(health_check))
            .route("/access/{user_id}", web::post().to(issue_tokens))
            .route("/refresh", web::post().to(refresh_tokens))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
