use rendezvous_core::{ConnectionId, Identity, RoomId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct Participant {
    identity: Identity,
    room_id: RoomId,
}

/// What a join changed, so the hub knows whom to notify.
#[derive(Debug, Default)]
pub struct JoinOutcome {
    /// Other members of the joined room, excluding the joiner.
    pub peers: Vec<ConnectionId>,
    /// Set when the connection moved here from another room.
    pub departed: Option<Departure>,
    /// Connection that previously owned the identity, if it was rebound.
    pub displaced: Option<ConnectionId>,
}

#[derive(Debug, Clone)]
pub struct Departure {
    pub identity: Identity,
    pub room_id: RoomId,
    pub remaining: Vec<ConnectionId>,
    /// False when a later join had already rebound the identity elsewhere.
    pub released_identity: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RegistryStats {
    pub connections: usize,
    pub identities: usize,
    pub rooms: usize,
}

/// Identity directory plus room membership.
///
/// Not synchronized; the hub owns it and is the only writer.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    identities: HashMap<Identity, ConnectionId>,
    participants: HashMap<ConnectionId, Participant>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        identity: Identity,
        room_id: RoomId,
    ) -> JoinOutcome {
        let mut outcome = JoinOutcome::default();

        let moving = self
            .participants
            .get(&connection_id)
            .is_some_and(|p| p.room_id != room_id || p.identity != identity);
        if moving {
            outcome.departed = self.leave(&connection_id);
        }

        if let Some(previous) = self.identities.insert(identity.clone(), connection_id) {
            if previous != connection_id {
                outcome.displaced = Some(previous);
            }
        }

        self.participants.insert(
            connection_id,
            Participant {
                identity,
                room_id: room_id.clone(),
            },
        );

        let members = self.rooms.entry(room_id).or_default();
        members.insert(connection_id);
        outcome.peers = members
            .iter()
            .filter(|member| **member != connection_id)
            .copied()
            .collect();

        outcome
    }

    /// Drop every entry held for `connection_id`.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let participant = self.participants.remove(connection_id)?;

        let released_identity = self.identities.get(&participant.identity) == Some(connection_id);
        if released_identity {
            self.identities.remove(&participant.identity);
        }

        let mut remaining = Vec::new();
        if let Some(members) = self.rooms.get_mut(&participant.room_id) {
            members.remove(connection_id);
            remaining = members.iter().copied().collect();
            if members.is_empty() {
                self.rooms.remove(&participant.room_id);
            }
        }

        Some(Departure {
            identity: participant.identity,
            room_id: participant.room_id,
            remaining,
            released_identity,
        })
    }

    pub fn resolve(&self, identity: &Identity) -> Option<ConnectionId> {
        self.identities.get(identity).copied()
    }

    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<&Identity> {
        self.participants.get(connection_id).map(|p| &p.identity)
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&RoomId> {
        self.participants.get(connection_id).map(|p| &p.room_id)
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            connections: self.participants.len(),
            identities: self.identities.len(),
            rooms: self.rooms.len(),
        }
    }
}
