//! Peer and channel directory.
//!
//! The [`Directory`] exclusively owns every [`Peer`] and [`Channel`]. Other
//! code refers to them by host, nickname, channel name or [`Route`] and
//! looks them up again when needed; nothing holds on to a reference across
//! a mutation.
//!
//! Indexes kept in step by every mutation:
//! - host → peer
//! - nickname → host
//! - route → hosts
//! - channel name → channel
//! - host → channel names

use std::collections::{HashMap, HashSet};

use crate::error::DirectoryError;
use crate::network::Route;

/// A known chat identity and the route that reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    host: String,
    nick: String,
    route: Route,
}

impl Peer {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current nickname; empty when none has been granted.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn has_nick(&self) -> bool {
        !self.nick.is_empty()
    }

    /// The route this peer was first seen on. Fixed for the peer's lifetime.
    pub fn route(&self) -> Route {
        self.route
    }
}

/// A named room with a topic, an op and a member set.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    topic: String,
    op: String,
    members: HashSet<String>,
    /// Members per route; a route is present iff the count is non-zero.
    routes: HashMap<Route, usize>,
}

impl Channel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Host of the peer allowed to change the topic.
    pub fn op(&self) -> &str {
        &self.op
    }

    pub fn is_member(&self, host: &str) -> bool {
        self.members.contains(host)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Member hosts, sorted.
    pub fn members(&self) -> Vec<&str> {
        let mut members: Vec<&str> = self.members.iter().map(String::as_str).collect();
        members.sort_unstable();
        members
    }

    /// Distinct routes that lead to at least one member, sorted.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self.routes.keys().copied().collect();
        routes.sort_unstable();
        routes
    }

    fn add_member(&mut self, host: &str, route: Route) {
        if self.members.insert(host.to_string()) {
            *self.routes.entry(route).or_insert(0) += 1;
        }
    }

    fn remove_member(&mut self, host: &str, route: Route) -> bool {
        if !self.members.remove(host) {
            return false;
        }
        if let Some(count) = self.routes.get_mut(&route) {
            *count -= 1;
            if *count == 0 {
                self.routes.remove(&route);
            }
        }
        true
    }
}

/// What a removal took out of the directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Peers removed, sorted by host.
    pub peers: Vec<Peer>,
    /// Channels left empty and therefore deleted, sorted.
    pub emptied_channels: Vec<String>,
}

/// Registry of peers and channels known to this server.
#[derive(Debug, Default)]
pub struct Directory {
    peers: HashMap<String, Peer>,
    nicks: HashMap<String, String>,
    by_route: HashMap<Route, HashSet<String>>,
    channels: HashMap<String, Channel>,
    memberships: HashMap<String, HashSet<String>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    // === Peers ===

    /// Register a new peer reachable through `route`, without a nickname.
    pub fn insert_peer(&mut self, host: &str, route: Route) -> Result<&Peer, DirectoryError> {
        if self.peers.contains_key(host) {
            return Err(DirectoryError::HostConflict(host.to_string()));
        }
        self.by_route
            .entry(route)
            .or_default()
            .insert(host.to_string());
        let peer = self.peers.entry(host.to_string()).or_insert(Peer {
            host: host.to_string(),
            nick: String::new(),
            route,
        });
        Ok(peer)
    }

    pub fn peer(&self, host: &str) -> Option<&Peer> {
        self.peers.get(host)
    }

    pub fn peer_by_nick(&self, nick: &str) -> Option<&Peer> {
        self.nicks.get(nick).and_then(|host| self.peers.get(host))
    }

    /// Peers behind a route, sorted by host.
    pub fn peers_on_route(&self, route: Route) -> Vec<&Peer> {
        let mut peers: Vec<&Peer> = self
            .by_route
            .get(&route)
            .into_iter()
            .flatten()
            .filter_map(|host| self.peers.get(host))
            .collect();
        peers.sort_unstable_by(|a, b| a.host.cmp(&b.host));
        peers
    }

    /// Give a peer a new nickname. An empty nickname clears it.
    ///
    /// Fails with `NameConflict` if another peer holds `nick`; renaming a
    /// peer to the nickname it already has succeeds without change.
    pub fn rename_peer(&mut self, host: &str, nick: &str) -> Result<(), DirectoryError> {
        if !self.peers.contains_key(host) {
            return Err(DirectoryError::UnknownPeer(host.to_string()));
        }
        if let Some(holder) = self.nicks.get(nick) {
            if holder == host {
                return Ok(());
            }
            return Err(DirectoryError::NameConflict(nick.to_string()));
        }

        let Some(peer) = self.peers.get_mut(host) else {
            return Err(DirectoryError::UnknownPeer(host.to_string()));
        };
        let old = std::mem::replace(&mut peer.nick, nick.to_string());
        if !old.is_empty() {
            self.nicks.remove(&old);
        }
        if !nick.is_empty() {
            self.nicks.insert(nick.to_string(), host.to_string());
        }
        Ok(())
    }

    /// Remove one peer and its channel memberships.
    pub fn remove_peer(&mut self, host: &str) -> Result<Removal, DirectoryError> {
        let mut removal = Removal::default();
        let peer = self.detach_peer(host, &mut removal.emptied_channels)?;
        removal.peers.push(peer);
        removal.emptied_channels.sort_unstable();
        Ok(removal)
    }

    /// Remove every peer behind `route`, their memberships and every
    /// channel that is left empty.
    pub fn remove_route(&mut self, route: Route) -> Removal {
        let mut removal = Removal::default();
        let hosts = self.by_route.remove(&route).unwrap_or_default();
        let mut hosts: Vec<String> = hosts.into_iter().collect();
        hosts.sort_unstable();

        for host in hosts {
            if let Ok(peer) = self.detach_peer(&host, &mut removal.emptied_channels) {
                removal.peers.push(peer);
            }
        }
        removal.emptied_channels.sort_unstable();
        removal
    }

    fn detach_peer(&mut self, host: &str, emptied: &mut Vec<String>) -> Result<Peer, DirectoryError> {
        let peer = self
            .peers
            .remove(host)
            .ok_or_else(|| DirectoryError::UnknownPeer(host.to_string()))?;

        if peer.has_nick() {
            self.nicks.remove(&peer.nick);
        }
        if let Some(hosts) = self.by_route.get_mut(&peer.route) {
            hosts.remove(host);
            if hosts.is_empty() {
                self.by_route.remove(&peer.route);
            }
        }
        for name in self.memberships.remove(host).unwrap_or_default() {
            let Some(channel) = self.channels.get_mut(&name) else {
                continue;
            };
            channel.remove_member(host, peer.route);
            if channel.members.is_empty() {
                self.channels.remove(&name);
                emptied.push(name);
            }
        }
        Ok(peer)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    // === Channels ===

    /// Create an empty channel.
    pub fn create_channel(
        &mut self,
        name: &str,
        op: &str,
        topic: &str,
    ) -> Result<&Channel, DirectoryError> {
        if self.channels.contains_key(name) {
            return Err(DirectoryError::ChannelExists(name.to_string()));
        }
        let channel = self.channels.entry(name.to_string()).or_insert(Channel {
            name: name.to_string(),
            topic: topic.to_string(),
            op: op.to_string(),
            members: HashSet::new(),
            routes: HashMap::new(),
        });
        Ok(channel)
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Add a known peer to an existing channel.
    pub fn join(&mut self, name: &str, host: &str) -> Result<(), DirectoryError> {
        let route = self
            .peers
            .get(host)
            .map(Peer::route)
            .ok_or_else(|| DirectoryError::UnknownPeer(host.to_string()))?;
        let channel = self
            .channels
            .get_mut(name)
            .ok_or_else(|| DirectoryError::UnknownChannel(name.to_string()))?;
        if channel.is_member(host) {
            return Err(DirectoryError::AlreadyMember {
                host: host.to_string(),
                channel: name.to_string(),
            });
        }

        channel.add_member(host, route);
        self.memberships
            .entry(host.to_string())
            .or_default()
            .insert(name.to_string());
        Ok(())
    }

    /// Remove a peer from a channel, deleting the channel if it empties.
    ///
    /// Returns whether the channel was deleted.
    pub fn leave(&mut self, name: &str, host: &str) -> Result<bool, DirectoryError> {
        let channel = self
            .channels
            .get_mut(name)
            .ok_or_else(|| DirectoryError::UnknownChannel(name.to_string()))?;
        let route = self.peers.get(host).map(Peer::route);
        let removed = match route {
            Some(route) => channel.remove_member(host, route),
            None => false,
        };
        if !removed {
            return Err(DirectoryError::NotMember {
                host: host.to_string(),
                channel: name.to_string(),
            });
        }

        if let Some(names) = self.memberships.get_mut(host) {
            names.remove(name);
            if names.is_empty() {
                self.memberships.remove(host);
            }
        }
        let emptied = channel.members.is_empty();
        if emptied {
            self.channels.remove(name);
        }
        Ok(emptied)
    }

    pub fn set_topic(&mut self, name: &str, topic: &str) -> Result<(), DirectoryError> {
        let channel = self
            .channels
            .get_mut(name)
            .ok_or_else(|| DirectoryError::UnknownChannel(name.to_string()))?;
        channel.topic = topic.to_string();
        Ok(())
    }

    pub fn set_op(&mut self, name: &str, op: &str) -> Result<(), DirectoryError> {
        let channel = self
            .channels
            .get_mut(name)
            .ok_or_else(|| DirectoryError::UnknownChannel(name.to_string()))?;
        channel.op = op.to_string();
        Ok(())
    }

    /// Delete a channel regardless of its members.
    pub fn delete_channel(&mut self, name: &str) -> Option<Channel> {
        let channel = self.channels.remove(name)?;
        for host in &channel.members {
            if let Some(names) = self.memberships.get_mut(host) {
                names.remove(name);
                if names.is_empty() {
                    self.memberships.remove(host);
                }
            }
        }
        Some(channel)
    }

    /// All channel names, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Channels a peer belongs to, sorted.
    pub fn channels_of(&self, host: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .memberships
            .get(host)
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: u64) -> Route {
        Route::new(id)
    }

    /// Every index agrees with the primary maps.
    fn assert_consistent(dir: &Directory) {
        for (nick, host) in &dir.nicks {
            assert_eq!(dir.peers[host].nick, *nick);
        }
        for peer in dir.peers.values() {
            if peer.has_nick() {
                assert_eq!(dir.nicks[&peer.nick], peer.host);
            }
            assert!(dir.by_route[&peer.route].contains(&peer.host));
        }
        for (r, hosts) in &dir.by_route {
            assert!(!hosts.is_empty());
            for host in hosts {
                assert_eq!(dir.peers[host].route, *r);
            }
        }
        for channel in dir.channels.values() {
            assert!(!channel.members.is_empty(), "empty channel {}", channel.name);
            let mut expected: HashMap<Route, usize> = HashMap::new();
            for host in &channel.members {
                *expected.entry(dir.peers[host].route).or_insert(0) += 1;
                assert!(dir.memberships[host].contains(&channel.name));
            }
            assert_eq!(channel.routes, expected);
        }
        for (host, names) in &dir.memberships {
            assert!(!names.is_empty());
            for name in names {
                assert!(dir.channels[name].is_member(host));
            }
        }
    }

    fn populated() -> Directory {
        let mut dir = Directory::new();
        dir.insert_peer("a1", route(1)).unwrap();
        dir.insert_peer("b1", route(2)).unwrap();
        dir.insert_peer("c1", route(2)).unwrap();
        dir.rename_peer("a1", "alice").unwrap();
        dir.rename_peer("b1", "bob").unwrap();
        dir.create_channel("lobby", "b1", "").unwrap();
        dir.join("lobby", "b1").unwrap();
        dir.join("lobby", "a1").unwrap();
        dir.create_channel("rust", "c1", "").unwrap();
        dir.join("rust", "c1").unwrap();
        dir.join("rust", "a1").unwrap();
        assert_consistent(&dir);
        dir
    }

    #[test]
    fn insert_and_lookup() {
        let mut dir = Directory::new();
        dir.insert_peer("a1", route(1)).unwrap();
        assert_eq!(
            dir.insert_peer("a1", route(2)),
            Err(DirectoryError::HostConflict("a1".into()))
        );
        let peer = dir.peer("a1").unwrap();
        assert_eq!(peer.route(), route(1));
        assert!(!peer.has_nick());
        assert!(dir.peer_by_nick("").is_none());
        assert_consistent(&dir);
    }

    #[test]
    fn rename_rejects_taken_nick() {
        let mut dir = populated();
        assert_eq!(
            dir.rename_peer("b1", "alice"),
            Err(DirectoryError::NameConflict("alice".into()))
        );
        assert_eq!(dir.peer("b1").unwrap().nick(), "bob");
        assert_eq!(dir.peer_by_nick("alice").unwrap().host(), "a1");

        dir.rename_peer("a1", "alice").unwrap();
        dir.rename_peer("a1", "ally").unwrap();
        assert!(dir.peer_by_nick("alice").is_none());
        assert_eq!(dir.peer_by_nick("ally").unwrap().host(), "a1");
        assert_eq!(
            dir.rename_peer("zz", "zed"),
            Err(DirectoryError::UnknownPeer("zz".into()))
        );
        assert_consistent(&dir);
    }

    #[test]
    fn channel_routes_follow_members() {
        let mut dir = populated();
        assert_eq!(dir.channel("lobby").unwrap().routes(), vec![route(1), route(2)]);

        dir.join("lobby", "c1").unwrap();
        assert!(!dir.leave("lobby", "b1").unwrap());
        // c1 still holds route 2 open.
        assert_eq!(dir.channel("lobby").unwrap().routes(), vec![route(1), route(2)]);

        assert!(!dir.leave("lobby", "c1").unwrap());
        assert_eq!(dir.channel("lobby").unwrap().routes(), vec![route(1)]);
        assert_consistent(&dir);
    }

    #[test]
    fn join_and_leave_errors() {
        let mut dir = populated();
        assert_eq!(
            dir.join("lobby", "a1"),
            Err(DirectoryError::AlreadyMember {
                host: "a1".into(),
                channel: "lobby".into()
            })
        );
        assert_eq!(
            dir.join("nowhere", "a1"),
            Err(DirectoryError::UnknownChannel("nowhere".into()))
        );
        assert_eq!(
            dir.leave("lobby", "c1"),
            Err(DirectoryError::NotMember {
                host: "c1".into(),
                channel: "lobby".into()
            })
        );
        assert!(dir.create_channel("lobby", "a1", "").is_err());
        assert_consistent(&dir);
    }

    #[test]
    fn last_leave_deletes_channel() {
        let mut dir = populated();
        assert!(!dir.leave("rust", "a1").unwrap());
        assert!(dir.leave("rust", "c1").unwrap());
        assert!(dir.channel("rust").is_none());
        assert_eq!(dir.channels_of("a1"), vec!["lobby".to_string()]);
        assert_consistent(&dir);
    }

    #[test]
    fn remove_route_cascades() {
        let mut dir = populated();
        let removal = dir.remove_route(route(2));

        let hosts: Vec<&str> = removal.peers.iter().map(Peer::host).collect();
        assert_eq!(hosts, vec!["b1", "c1"]);
        assert!(removal.emptied_channels.is_empty());
        assert!(dir.peers_on_route(route(2)).is_empty());
        assert!(dir.peer_by_nick("bob").is_none());

        // a1 keeps both channels alive, now reachable only through route 1.
        assert_eq!(dir.channel("lobby").unwrap().routes(), vec![route(1)]);
        assert_eq!(dir.channel("rust").unwrap().members(), vec!["a1"]);
        assert_consistent(&dir);

        let removal = dir.remove_route(route(1));
        assert_eq!(removal.emptied_channels, vec!["lobby", "rust"]);
        assert_eq!(dir.channel_count(), 0);
        assert_eq!(dir.peer_count(), 0);
        assert_consistent(&dir);
    }

    #[test]
    fn remove_peer_keeps_route_siblings() {
        let mut dir = populated();
        let removal = dir.remove_peer("c1").unwrap();
        assert_eq!(removal.peers.len(), 1);
        assert!(removal.emptied_channels.is_empty());
        assert_eq!(dir.peers_on_route(route(2)).len(), 1);
        assert!(dir.remove_peer("c1").is_err());
        assert_consistent(&dir);
    }

    #[test]
    fn delete_channel_drops_memberships() {
        let mut dir = populated();
        let channel = dir.delete_channel("lobby").unwrap();
        assert_eq!(channel.member_count(), 2);
        assert_eq!(dir.channels_of("b1"), Vec::<String>::new());
        assert_eq!(dir.channel_names(), vec!["rust".to_string()]);
        assert!(dir.delete_channel("lobby").is_none());
        assert_consistent(&dir);
    }

    #[test]
    fn topic_and_op_updates() {
        let mut dir = populated();
        dir.set_topic("lobby", "weekly sync").unwrap();
        dir.set_op("lobby", "a1").unwrap();
        let lobby = dir.channel("lobby").unwrap();
        assert_eq!(lobby.topic(), "weekly sync");
        assert_eq!(lobby.op(), "a1");
        assert!(dir.set_topic("nowhere", "x").is_err());
    }
}
