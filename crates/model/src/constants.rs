use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9080);
