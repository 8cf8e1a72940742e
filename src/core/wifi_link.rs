use crate::logging::debug_println;
use std::collections::{HashMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Raw frame in the air, as read out of the sender's TX slot.
pub type Packet = Vec<u16>;

#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StationId(pub u16);

impl Display for StationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "station {}", self.0)
    }
}

#[derive(Default)]
struct StationState {
    connections: Vec<StationId>,
    packets: VecDeque<Packet>,
}

/// The part of a wifi peripheral other consoles can touch: who it's connected to and what's
/// waiting to be received.
pub struct Station {
    id: StationId,
    state: Mutex<StationState>,
    connection_count: AtomicUsize,
}

impl Station {
    fn new(id: StationId) -> Self {
        Station {
            id,
            state: Mutex::new(StationState::default()),
            connection_count: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, StationState> {
        self.state.lock().unwrap()
    }

    fn link(&self, peer: StationId) -> bool {
        let mut state = self.lock();
        if peer == self.id || state.connections.contains(&peer) {
            return false;
        }
        state.connections.push(peer);
        self.connection_count.store(state.connections.len(), Ordering::Release);
        true
    }

    fn unlink(&self, peer: StationId) -> bool {
        let mut state = self.lock();
        match state.connections.iter().position(|id| *id == peer) {
            Some(index) => {
                state.connections.swap_remove(index);
                self.connection_count.store(state.connections.len(), Ordering::Release);
                true
            }
            None => false,
        }
    }

    fn connections(&self) -> Vec<StationId> {
        self.lock().connections.clone()
    }

    fn push_packet(&self, packet: Packet) -> usize {
        let mut state = self.lock();
        state.packets.push_back(packet);
        state.packets.len()
    }

    fn take_packets(&self) -> VecDeque<Packet> {
        std::mem::take(&mut self.lock().packets)
    }

    pub fn has_connections(&self) -> bool {
        self.connection_count.load(Ordering::Acquire) != 0
    }

    pub fn is_connected(&self, peer: StationId) -> bool {
        self.lock().connections.contains(&peer)
    }

    pub fn queued_packets(&self) -> usize {
        self.lock().packets.len()
    }

    #[cfg(test)]
    pub(crate) fn front_packet(&self) -> Option<Packet> {
        self.lock().packets.front().cloned()
    }
}

/// Registry of every wifi peripheral in the process. Peers only know each other by
/// [`StationId`], the hub resolves them.
pub struct WifiHub {
    stations: RwLock<HashMap<StationId, Arc<Station>>>,
    next_id: AtomicU16,
}

impl WifiHub {
    pub fn new() -> Arc<Self> {
        Arc::new(WifiHub {
            stations: RwLock::new(HashMap::new()),
            next_id: AtomicU16::new(0),
        })
    }

    fn register(&self) -> Arc<Station> {
        let mut stations = self.stations.write().unwrap();
        // ids wrap around, skip the ones still held by live stations
        let id = loop {
            let id = StationId(self.next_id.fetch_add(1, Ordering::Relaxed));
            if !stations.contains_key(&id) {
                break id;
            }
        };
        let station = Arc::new(Station::new(id));
        stations.insert(id, station.clone());
        station
    }

    fn unregister(&self, id: StationId) {
        self.stations.write().unwrap().remove(&id);
    }

    pub fn station(&self, id: StationId) -> Option<Arc<Station>> {
        self.stations.read().unwrap().get(&id).cloned()
    }

    pub fn station_ids(&self) -> Vec<StationId> {
        let mut ids: Vec<_> = self.stations.read().unwrap().keys().copied().collect();
        ids.sort();
        ids
    }
}

/// Connection relay endpoint owned by one wifi peripheral.
///
/// Only the station's own lock is ever held at a time, pushing into a peer goes through the
/// peer's lock after ours has been released. Two consoles transmitting to each other can't
/// deadlock that way.
pub struct WifiLink {
    hub: Arc<WifiHub>,
    station: Arc<Station>,
}

impl WifiLink {
    pub fn new(hub: &Arc<WifiHub>) -> Self {
        WifiLink {
            hub: hub.clone(),
            station: hub.register(),
        }
    }

    pub fn id(&self) -> StationId {
        self.station.id
    }

    pub fn hub(&self) -> &Arc<WifiHub> {
        &self.hub
    }

    pub fn station(&self) -> &Arc<Station> {
        &self.station
    }

    pub fn add_connection(&self, peer: StationId) {
        if peer == self.id() {
            return;
        }
        let Some(peer_station) = self.hub.station(peer) else {
            debug_println!("{} can't connect to unknown {peer}", self.id());
            return;
        };
        if self.station.link(peer) {
            debug_println!("{} connected to {peer}", self.id());
        }
        peer_station.link(self.id());
    }

    pub fn rem_connection(&self, peer: StationId) {
        if self.station.unlink(peer) {
            debug_println!("{} disconnected from {peer}", self.id());
        }
        if let Some(peer_station) = self.hub.station(peer) {
            peer_station.unlink(self.id());
        }
    }

    pub fn is_connected(&self, peer: StationId) -> bool {
        self.station.is_connected(peer)
    }

    pub fn connections(&self) -> Vec<StationId> {
        self.station.connections()
    }

    pub fn has_connections(&self) -> bool {
        self.station.has_connections()
    }

    /// Queues a copy of `packet` on every connected peer, returns how many got it.
    pub fn broadcast(&self, packet: &[u16]) -> usize {
        let mut delivered = 0;
        for peer in self.station.connections() {
            match self.hub.station(peer) {
                Some(peer_station) => {
                    let queued = peer_station.push_packet(packet.to_vec());
                    debug_println!("{} queued {} halfwords for {peer} ({queued} pending)", self.id(), packet.len());
                    delivered += 1;
                }
                None => {
                    self.station.unlink(peer);
                }
            }
        }
        delivered
    }

    pub fn take_packets(&self) -> VecDeque<Packet> {
        self.station.take_packets()
    }
}

impl Drop for WifiLink {
    fn drop(&mut self) {
        self.hub.unregister(self.id());
        for peer in self.station.connections() {
            self.rem_connection(peer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn connections_are_symmetric() {
        let hub = WifiHub::new();
        let a = WifiLink::new(&hub);
        let b = WifiLink::new(&hub);

        a.add_connection(b.id());
        assert!(a.is_connected(b.id()));
        assert!(b.is_connected(a.id()));
        assert!(a.has_connections());
        assert!(b.has_connections());

        a.rem_connection(b.id());
        assert!(!a.is_connected(b.id()));
        assert!(!b.is_connected(a.id()));
        assert!(!a.has_connections());
        assert!(!b.has_connections());
    }

    #[test]
    fn never_connects_to_itself_or_twice() {
        let hub = WifiHub::new();
        let a = WifiLink::new(&hub);
        let b = WifiLink::new(&hub);

        a.add_connection(a.id());
        assert!(!a.has_connections());

        a.add_connection(b.id());
        b.add_connection(a.id());
        assert_eq!(a.connections(), vec![b.id()]);
        assert_eq!(b.connections(), vec![a.id()]);
    }

    #[test]
    fn removing_non_member_is_noop() {
        let hub = WifiHub::new();
        let a = WifiLink::new(&hub);
        let b = WifiLink::new(&hub);
        let c = WifiLink::new(&hub);

        a.add_connection(b.id());
        a.rem_connection(c.id());
        a.rem_connection(StationId(0xFFFF));
        assert_eq!(a.connections(), vec![b.id()]);
    }

    #[test]
    fn wrapped_ids_skip_live_stations() {
        let hub = WifiHub::new();
        let first = WifiLink::new(&hub);
        assert_eq!(first.id(), StationId(0));

        hub.next_id.store(u16::MAX, Ordering::Relaxed);
        let last = WifiLink::new(&hub);
        let wrapped = WifiLink::new(&hub);
        assert_eq!(last.id(), StationId(u16::MAX));
        assert_eq!(wrapped.id(), StationId(1));

        assert!(Arc::ptr_eq(&hub.station(first.id()).unwrap(), first.station()));
        assert_eq!(hub.station_ids(), vec![StationId(0), StationId(1), StationId(u16::MAX)]);
    }

    #[test]
    fn broadcast_is_fifo_per_peer() {
        let hub = WifiHub::new();
        let a = WifiLink::new(&hub);
        let b = WifiLink::new(&hub);
        let c = WifiLink::new(&hub);
        a.add_connection(b.id());
        a.add_connection(c.id());

        assert_eq!(a.broadcast(&[1, 2, 3]), 2);
        assert_eq!(a.broadcast(&[4, 5]), 2);

        assert_eq!(b.station().front_packet(), Some(vec![1, 2, 3]));
        let packets: Vec<_> = c.take_packets().into_iter().collect();
        assert_eq!(packets, vec![vec![1, 2, 3], vec![4, 5]]);
        assert_eq!(c.station().queued_packets(), 0);
        assert_eq!(b.station().queued_packets(), 2);
        assert_eq!(a.station().queued_packets(), 0);
    }

    #[test]
    fn dropping_a_link_disconnects_it_everywhere() {
        let hub = WifiHub::new();
        let a = WifiLink::new(&hub);
        let b = WifiLink::new(&hub);
        let b_id = b.id();
        a.add_connection(b_id);

        drop(b);
        assert!(!a.is_connected(b_id));
        assert!(hub.station(b_id).is_none());
        assert_eq!(hub.station_ids(), vec![a.id()]);
        assert_eq!(a.broadcast(&[1]), 0);
    }

    #[test]
    fn concurrent_mutual_broadcasts_dont_deadlock() {
        const ROUNDS: usize = 20_000;

        let hub = WifiHub::new();
        let a = WifiLink::new(&hub);
        let b = WifiLink::new(&hub);
        a.add_connection(b.id());

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|link| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..ROUNDS {
                        assert_eq!(link.broadcast(&[i as u16]), 1);
                        if i % 64 == 0 {
                            link.take_packets();
                        }
                    }
                    barrier.wait();
                    link.take_packets();
                    link
                })
            })
            .collect();

        let links: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
        assert!(links[0].is_connected(links[1].id()));
        assert!(links[1].is_connected(links[0].id()));
    }
}
