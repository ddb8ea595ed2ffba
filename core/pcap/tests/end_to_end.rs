use byteorder::{BigEndian, ByteOrder};
use format::source::Mem;
use format::Format;

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86dd;
const PROTO_UDP: u8 = 17;

fn pcap_bytes(data_link_type: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&[0xa1, 0xb2, 0xc3, 0xd4]);
    buf.extend_from_slice(&2u16.to_be_bytes());
    buf.extend_from_slice(&4u16.to_be_bytes());
    buf.extend_from_slice(&0i32.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(&65535u32.to_be_bytes());
    buf.extend_from_slice(&data_link_type.to_be_bytes());
    for frame in frames {
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&(frame.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(frame.len() as u32).to_be_bytes());
        buf.extend_from_slice(frame);
    }
    buf
}

fn ethernet_frame(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut eth = vec![0u8; 14];
    eth[0..6].copy_from_slice(&[0xaa; 6]);
    eth[6..12].copy_from_slice(&[0xbb; 6]);
    BigEndian::write_u16(&mut eth[12..14], ethertype);
    eth.extend_from_slice(payload);
    eth
}

fn ipv4_packet(protocol: u8, payload: &[u8]) -> Vec<u8> {
    let mut ip = vec![0u8; 20];
    ip[0] = (4 << 4) | 5;
    BigEndian::write_u16(&mut ip[2..4], (20 + payload.len()) as u16);
    ip[8] = 64;
    ip[9] = protocol;
    ip[12..16].copy_from_slice(&[10, 0, 0, 1]);
    ip[16..20].copy_from_slice(&[10, 0, 0, 2]);
    ip.extend_from_slice(payload);
    ip
}

fn ipv6_packet(next_header: u8, payload: &[u8]) -> Vec<u8> {
    let mut ip = vec![0u8; 40];
    ip[0] = 6 << 4;
    BigEndian::write_u16(&mut ip[4..6], payload.len() as u16);
    ip[6] = next_header;
    ip[7] = 64;
    ip[8..24].copy_from_slice(&[1u8; 16]);
    ip[24..40].copy_from_slice(&[2u8; 16]);
    ip.extend_from_slice(payload);
    ip
}

fn udp_datagram(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut udp = vec![0u8; 8];
    BigEndian::write_u16(&mut udp[0..2], src_port);
    BigEndian::write_u16(&mut udp[2..4], dst_port);
    BigEndian::write_u16(&mut udp[4..6], (8 + payload.len()) as u16);
    udp.extend_from_slice(payload);
    udp
}

fn rtp_frame(sequence_number: u16, timestamp: u32, ssrc: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 12];
    buf[0] = 0b1000_0000;
    buf[1] = 96;
    BigEndian::write_u16(&mut buf[2..4], sequence_number);
    BigEndian::write_u32(&mut buf[4..8], timestamp);
    BigEndian::write_u32(&mut buf[8..12], ssrc);
    buf.extend_from_slice(payload);
    buf
}

/// A PCAP file with a single Ethernet/IPv4/UDP/RTP frame, decoded through
/// the full network-layer stack plus UDP and RTP, yields the carried RTP
/// header fields and payload byte-for-byte.
#[test]
fn pcap_to_rtp_decodes_header_and_payload() {
    let payload = [9u8, 1, 8, 2, 7, 3, 6, 4, 5];
    let rtp_bytes = rtp_frame(12345, 0x1234_5678, 0x8765_4321, &payload);
    let udp_bytes = udp_datagram(5004, 5004, &rtp_bytes);
    let ip_bytes = ipv4_packet(PROTO_UDP, &udp_bytes);
    let eth_bytes = ethernet_frame(ETHERTYPE_IPV4, &ip_bytes);
    let pcap_file = pcap_bytes(pcap::link_type::ETHERNET, &[eth_bytes]);

    let pcap = pcap::Pcap::open(Box::new(Mem::from_bytes(pcap_file))).unwrap();
    let network = pcap::create_network_layer_format(pcap).unwrap();
    let udp_fmt: Box<dyn Format> = Box::new(udp::Udp::open(network).unwrap());
    let mut rtp_fmt = rtp::Rtp::open(udp_fmt).unwrap();

    let out = rtp_fmt.next_chunk(0).unwrap();
    assert_eq!(out, payload);

    let hdr = rtp_fmt.current_header().unwrap();
    assert_eq!(hdr.sequence_number, 12345);
    assert_eq!(hdr.timestamp, 0x1234_5678);
    assert_eq!(hdr.ssrc, 0x8765_4321);
    assert!(rtp_fmt.current_padding().is_none());
}

/// A PCAP file mixing 6 IPv4 and 4 IPv6 UDP packets is decoded through
/// PCAP→ethernet_ip→UDP in order, and `get(udp,"ipv4")`/`get(udp,"ipv6")`
/// account for all 10 packets with the stated per-family counts.
#[test]
fn pcap_to_udp_mixed_ipv4_ipv6_traffic() {
    let payloads: [&[u8]; 10] = [
        b"adfsdafsdf\n",
        b"crucial\n",
        b"renowned\n",
        b"Pimping\n",
        b"noodle\n",
        b"dump\n",
        b"cooker\n",
        b"in\n",
        b"the\n",
        b"fields\n",
    ];
    // First 6 packets travel over IPv4, the remaining 4 over IPv6.
    let is_ipv4 = [true, true, true, true, true, true, false, false, false, false];

    let frames: Vec<Vec<u8>> = payloads
        .iter()
        .zip(is_ipv4.iter())
        .map(|(payload, &v4)| {
            let udp_bytes = udp_datagram(6000, 6001, payload);
            if v4 {
                let ip_bytes = ipv4_packet(PROTO_UDP, &udp_bytes);
                ethernet_frame(ETHERTYPE_IPV4, &ip_bytes)
            } else {
                let ip_bytes = ipv6_packet(17, &udp_bytes);
                ethernet_frame(ETHERTYPE_IPV6, &ip_bytes)
            }
        })
        .collect();

    let pcap_file = pcap_bytes(pcap::link_type::ETHERNET, &frames);
    let pcap = pcap::Pcap::open(Box::new(Mem::from_bytes(pcap_file))).unwrap();
    let network = pcap::create_network_layer_format(pcap).unwrap();
    let mut udp_fmt = udp::Udp::open(network).unwrap();

    let mut decoded = Vec::new();
    let mut ipv4_count = 0;
    let mut ipv6_count = 0;
    while udp_fmt.has_more_data() {
        let out = udp_fmt.next_chunk(0).unwrap();
        if out.is_empty() {
            break;
        }
        decoded.push(out);
        if format::get(&mut udp_fmt, "ipv4").is_some() {
            ipv4_count += 1;
        }
        if format::get(&mut udp_fmt, "ipv6").is_some() {
            ipv6_count += 1;
        }
    }

    assert_eq!(decoded.len(), 10);
    for (out, expected) in decoded.iter().zip(payloads.iter()) {
        assert_eq!(out, expected);
    }
    assert_eq!(ipv4_count, 6);
    assert_eq!(ipv6_count, 4);
    assert_eq!(ipv4_count + ipv6_count, 10);
}
