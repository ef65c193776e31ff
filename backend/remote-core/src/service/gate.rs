use crate::error::ServiceError;

use common::ErrorLocation;

use std::net::{IpAddr, SocketAddr};
use std::panic::Location;

use tokio::sync::{Mutex, MutexGuard, mpsc};
use uuid::Uuid;

/// Who is making the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerTicket {
    peer: SocketAddr,
    session_id: Uuid,
}

impl CallerTicket {
    pub fn new(peer: SocketAddr, session_id: Uuid) -> Self {
        Self { peer, session_id }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Observed address of the caller, IPv4-mapped addresses unwrapped.
    pub fn ip(&self) -> IpAddr {
        self.peer.ip().to_canonical()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Single-slot rendezvous between sessions and the dispatcher.
///
/// A session hands its ticket in before each call and waits while the slot is
/// taken. The dispatcher takes the ticket out and keeps the receiving end
/// locked until the call has finished, so at most one call runs at a time
/// across all sessions and the ticket in hand always names the current
/// caller.
#[derive(Debug)]
pub struct RendezvousGate {
    sender: mpsc::Sender<CallerTicket>,
    receiver: Mutex<mpsc::Receiver<CallerTicket>>,
}

/// Proof that the holder is the only call in progress. Dropping it lets the
/// next caller through.
#[derive(Debug)]
pub struct Admission<'a> {
    _receiver: MutexGuard<'a, mpsc::Receiver<CallerTicket>>,
    ticket: CallerTicket,
}

impl Admission<'_> {
    pub fn ticket(&self) -> CallerTicket {
        self.ticket
    }
}

impl RendezvousGate {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(1);
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Hand `ticket` in and wait for the turn of whichever ticket comes out.
    ///
    /// With one slot, the ticket taken out is the one this caller handed in:
    /// no other caller can hand in until the slot has been emptied.
    pub async fn admit(&self, ticket: CallerTicket) -> Result<Admission<'_>, ServiceError> {
        self.sender
            .send(ticket)
            .await
            .map_err(|e| ServiceError::Send {
                message: format!("rendezvous gate closed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut receiver = self.receiver.lock().await;
        let ticket = receiver.recv().await.ok_or_else(|| ServiceError::Read {
            message: String::from("rendezvous gate closed"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Admission {
            _receiver: receiver,
            ticket,
        })
    }
}

impl Default for RendezvousGate {
    fn default() -> Self {
        Self::new()
    }
}
