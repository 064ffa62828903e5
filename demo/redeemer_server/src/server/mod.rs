mod session;

use probtix::alloy_primitives::Address;
use probtix::{MemoryLedger, TicketDefaults};

use std::{error::Error, net, sync::Arc, thread, time::Duration};

pub(crate) const SOCKET_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const SOCKET_WRITE_TIMEOUT: Duration = Duration::from_secs(8);

pub(crate) fn serve(
    bind_addr: String,
    ledger: Arc<MemoryLedger>,
    receiver: Address,
    defaults: TicketDefaults,
) -> Result<(), Box<dyn Error>> {
    tracing::info!(%bind_addr, "starting listener");
    let listener = net::TcpListener::bind(bind_addr)?;

    for stream in listener.incoming() {
        let conn = match stream {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "error accepting TCP connection");
                continue;
            }
        };

        match conn.peer_addr() {
            Ok(peer_addr) => tracing::info!(%peer_addr, "received new TCP connection"),
            Err(e) => tracing::warn!(error = %e, "new TCP connection; unable to get peer address"),
        }

        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            if let Err(e) = session::run_session(&ledger, receiver, defaults, conn) {
                tracing::warn!(error = %e, "session ended with an error");
            }
        });
    }
    Ok(())
}
