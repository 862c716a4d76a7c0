use metar_sms::server::Server;
use metar_sms::{AvwxClient, Config, TwilioClient};
use std::convert::Infallible;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter(None, log::LevelFilter::Info)
        .filter_module("metar_sms", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("configuration error: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("{:?}", config);

    let messenger = TwilioClient::from_config(&config);
    log::info!("replying from {}", messenger.sender());

    let context = Arc::new(Server::new(AvwxClient::from_config(&config), messenger));

    let make_service =
        hyper::service::make_service_fn(move |socket: &hyper::server::conn::AddrStream| {
            let context = context.clone();
            let addr = socket.remote_addr();
            async move {
                Ok::<_, Infallible>(hyper::service::service_fn(move |req| {
                    let context = context.clone();
                    async move { context.serve(addr, req).await }
                }))
            }
        });

    let addr = config.listen_addr();
    let server = match hyper::server::Server::try_bind(&addr) {
        Ok(builder) => builder.serve(make_service),
        Err(e) => {
            log::error!("could not listen on {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    log::info!("listening for HTTP requests on {}", addr);

    if let Err(e) = server.await {
        log::error!("server error: {}", e);
        std::process::exit(1);
    }
}
