use std::sync::Arc;

use vectura::config::Config;
use vectura::db::PgPool;
use vectura::engine::Engine;
use vectura::external::mailer::HttpMailer;
use vectura::server::serve;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().unwrap();

    let PgPool(pool) = PgPool::new(&config.database_url, 5).await.unwrap();

    let mailer = Arc::new(HttpMailer::new(&config));

    let engine = Engine::new(pool, mailer).await.unwrap();

    serve(engine, config.bind_addr()).await;
}
