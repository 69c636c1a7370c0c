/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Transport seam of a session.

use bytes::Bytes;

/// Hands serialized messages to the transport.
///
/// Sending is fire-and-forget: the session never waits on the network.
pub trait Responder: Send + Sync {
    /// Queues `data` for transmission. Returns false if the transport has
    /// gone away.
    fn send(&self, data: Bytes) -> bool;

    /// Closes the transport.
    fn disconnect(&self);

    /// Returns the peer address, if known.
    fn remote_address(&self) -> Option<String> {
        None
    }
}
