//! Serveur SSDP

use super::{
    MAX_AGE, SSDP_MULTICAST_ADDR, SSDP_PORT, SsdpDevice, alive_message, byebye_message,
    multicast_target, parse_search_target, search_response,
};
use parking_lot::RwLock;
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Serveur SSDP gérant les annonces et les réponses aux M-SEARCH
pub struct SsdpServer {
    /// Devices enregistrés (UUID -> Device)
    devices: Arc<RwLock<HashMap<String, SsdpDevice>>>,

    socket: Option<Arc<UdpSocket>>,

    /// Période des annonces `ssdp:alive`
    interval: Duration,

    running: Arc<AtomicBool>,
}

impl SsdpServer {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs((MAX_AGE / 2) as u64))
    }

    /// Serveur annonçant ses devices toutes les `interval`
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            socket: None,
            interval: interval.max(Duration::from_secs(1)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ouvre la socket multicast et lance les threads d'annonce et d'écoute
    pub fn start(&mut self) -> std::io::Result<()> {
        let socket = Self::bind_multicast()?;
        let socket = Arc::new(socket);
        self.socket = Some(socket.clone());
        self.running.store(true, Ordering::SeqCst);

        info!("✅ SSDP server started on {}:{}", SSDP_MULTICAST_ADDR, SSDP_PORT);

        self.start_periodic_announcements(socket.clone());
        self.start_msearch_listener(socket);

        Ok(())
    }

    fn bind_multicast() -> std::io::Result<UdpSocket> {
        let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        raw.set_reuse_address(true)?;
        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), SSDP_PORT);
        raw.bind(&bind_addr.into())?;

        let socket: UdpSocket = raw.into();
        socket.set_read_timeout(Some(Duration::from_secs(1)))?;
        socket.set_multicast_loop_v4(false)?;

        let mut joined = false;
        for iface in get_if_addrs::get_if_addrs()? {
            if let IpAddr::V4(ipv4) = iface.ip() {
                if ipv4.is_loopback() {
                    continue;
                }
                match socket.join_multicast_v4(&SSDP_MULTICAST_ADDR, &ipv4) {
                    Ok(()) => {
                        debug!("SSDP: joined {} on {}", SSDP_MULTICAST_ADDR, ipv4);
                        joined = true;
                    }
                    Err(e) => warn!("SSDP: failed to join {} on {}: {}", SSDP_MULTICAST_ADDR, ipv4, e),
                }
            }
        }
        if !joined {
            socket.join_multicast_v4(&SSDP_MULTICAST_ADDR, &Ipv4Addr::UNSPECIFIED)?;
        }

        Ok(socket)
    }

    /// Ajoute un device et envoie un alive initial
    pub fn add_device(&self, device: SsdpDevice) {
        self.devices
            .write()
            .insert(device.uuid.clone(), device.clone());

        if let Some(socket) = &self.socket {
            for nt in &device.notification_types {
                send(socket, &alive_message(&device, nt), multicast_target(), "alive");
            }
        }
    }

    /// Supprime un device et envoie un byebye
    pub fn remove_device(&self, uuid: &str) {
        let removed = self.devices.write().remove(uuid);
        if let (Some(device), Some(socket)) = (removed, &self.socket) {
            for nt in &device.notification_types {
                send(socket, &byebye_message(&device, nt), multicast_target(), "byebye");
            }
        }
    }

    fn start_periodic_announcements(&self, socket: Arc<UdpSocket>) {
        let devices = Arc::clone(&self.devices);
        let running = Arc::clone(&self.running);
        let period = self.interval;

        std::thread::spawn(move || {
            let mut last = Instant::now();
            while running.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(500));
                if last.elapsed() < period {
                    continue;
                }
                last = Instant::now();

                for device in devices.read().values() {
                    for nt in &device.notification_types {
                        send(&socket, &alive_message(device, nt), multicast_target(), "alive");
                    }
                }
            }
        });
    }

    fn start_msearch_listener(&self, socket: Arc<UdpSocket>) {
        let devices = Arc::clone(&self.devices);
        let running = Arc::clone(&self.running);

        std::thread::spawn(move || {
            let mut buf = [0u8; 8192];
            while running.load(Ordering::SeqCst) {
                match socket.recv_from(&mut buf) {
                    Ok((n, src)) => {
                        let data = String::from_utf8_lossy(&buf[..n]);
                        let Some(st) = parse_search_target(&data) else {
                            continue;
                        };
                        debug!("M-SEARCH from {} with ST={}", src, st);
                        for device in devices.read().values() {
                            for target in device.search_targets(&st) {
                                send(&socket, &search_response(device, target), src, "M-SEARCH response");
                            }
                        }
                    }
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(e) => warn!("❌ SSDP read error: {}", e),
                }
            }
        });
    }
}

fn send(socket: &UdpSocket, msg: &str, to: SocketAddr, kind: &str) {
    match socket.send_to(msg.as_bytes(), to) {
        Ok(_) => debug!("📡 SSDP {} sent to {}", kind, to),
        Err(e) => warn!("❌ Failed to send SSDP {} to {}: {}", kind, to, e),
    }
}

impl Default for SsdpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SsdpServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(socket) = &self.socket {
            info!("👋 Shutting down SSDP server, sending byebye for all devices");
            for device in self.devices.read().values() {
                for nt in &device.notification_types {
                    send(socket, &byebye_message(device, nt), multicast_target(), "byebye");
                }
            }
        }
    }
}
