/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Two sessions talking over an in-memory pipe.
//!
//! The initiator logs on, sends one order and logs out. Run with
//! `RUST_LOG=debug` to see every message on the wire.

use async_trait::async_trait;
use rivetfix::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CL_ORD_ID: u32 = 11;

struct Printer {
    name: &'static str,
}

#[async_trait]
impl Application for Printer {
    async fn on_create(&self, session_id: &SessionId) {
        info!(side = self.name, %session_id, "session created");
    }

    async fn on_logon(&self, session_id: &SessionId) {
        info!(side = self.name, %session_id, "logged on");
    }

    async fn on_logout(&self, session_id: &SessionId) {
        info!(side = self.name, %session_id, "logged out");
    }

    async fn to_admin(&self, _message: &mut Message, _session_id: &SessionId) {}

    async fn from_admin(
        &self,
        _message: &Message,
        _session_id: &SessionId,
    ) -> std::result::Result<(), ApplicationError> {
        Ok(())
    }

    async fn to_app(
        &self,
        _message: &mut Message,
        _session_id: &SessionId,
    ) -> std::result::Result<(), DoNotSend> {
        Ok(())
    }

    async fn from_app(
        &self,
        message: &Message,
        _session_id: &SessionId,
    ) -> std::result::Result<(), ApplicationError> {
        let id = message.body().get_str(CL_ORD_ID)?;
        info!(side = self.name, cl_ord_id = id, "order received");
        Ok(())
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn session(
    sender: &str,
    target: &str,
    role: SessionRole,
    name: &'static str,
) -> anyhow::Result<Arc<Session>> {
    let id = SessionId::new(
        FixVersion::Fix44,
        CompId::new(sender).ok_or_else(|| anyhow::anyhow!("bad CompID {sender}"))?,
        CompId::new(target).ok_or_else(|| anyhow::anyhow!("bad CompID {target}"))?,
    );
    let session = Session::builder(SessionConfig::new(id).with_role(role))
        .with_application(Arc::new(Printer { name }))
        .build()
        .await?;
    Ok(Arc::new(session))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let server = session("SERVER", "CLIENT", SessionRole::Acceptor, "server").await?;
    let client = session("CLIENT", "SERVER", SessionRole::Initiator, "client").await?;
    SessionRegistry::global().register(client.clone())?;

    let options = ConnectionOptions::default().with_tick_interval(Duration::from_millis(100));
    let (server_end, client_end) = tokio::io::duplex(64 * 1024);
    let server_task = tokio::spawn(run_connection(
        server.clone(),
        server_end,
        Some("client".to_string()),
        options,
    ));
    let client_task = tokio::spawn(run_connection(
        client.clone(),
        client_end,
        Some("server".to_string()),
        options,
    ));

    tokio::time::timeout(Duration::from_secs(5), async {
        while !client.is_logged_on() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await?;

    let mut order = Message::with_type(&MsgType::NewOrderSingle);
    order.body_mut().set_str(CL_ORD_ID, "DEMO-1");
    let sent = SessionRegistry::global()
        .send_to_target(order, Some(client.session_id()))
        .await?;
    info!(sent, "order handed to transport");

    tokio::time::sleep(Duration::from_millis(200)).await;
    client.logout(Some("demo finished"));

    let (server_result, client_result) =
        tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(server_task, client_task)
        })
        .await?;
    server_result??;
    client_result??;

    info!(
        client_next_sender = client.expected_sender_num(),
        server_next_target = server.expected_target_num(),
        "done"
    );
    Ok(())
}
