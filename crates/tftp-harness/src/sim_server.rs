//! Server hosts inside a simulation.

use std::net::{Ipv4Addr, SocketAddr};

use tftp_core::MemoryStore;
use tftp_server::{Server, ServerConfig};
use turmoil::Sim;

use crate::SimTransport;

/// Port the simulated server listens on.
pub const SERVER_PORT: u16 = 6969;

/// Register a host named `name` running the accept loop over `store`.
///
/// The store is shared with the caller, so files written by simulated
/// clients can be inspected after the run.
pub fn host_server(sim: &mut Sim<'_>, name: &str, store: &MemoryStore, config: ServerConfig) {
    let store = store.clone();
    sim.host(name, move || {
        let store = store.clone();
        let config = config.clone();
        async move {
            let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, SERVER_PORT));
            let transport = SimTransport::bind(addr).await?;
            Server::new(transport, store, config).run().await?;
            Ok(())
        }
    });
}
