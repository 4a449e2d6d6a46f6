//! End-to-end dump tests against a scripted socket.

use std::io;

use genlink::netlink::genl::{
    CtrlAttr, CtrlAttrMcastGrp, CtrlAttrOp, CtrlCmd, GENL_ID_CTRL, GenlMsgHdr, dump_families,
};
use genlink::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_MULTI, NLM_F_REQUEST};
use genlink::netlink::{Error, MessageBuilder, NLMSG_HDRLEN, NlMsgHdr, NlMsgType, Transport};

/// Test double for the kernel side of the socket: records what was sent,
/// plays back a scripted list of reads.
struct FakeKernel {
    sent: Vec<Vec<u8>>,
    reads: Vec<io::Result<Vec<u8>>>,
}

impl FakeKernel {
    fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
        Self {
            sent: Vec::new(),
            reads,
        }
    }
}

impl Transport for FakeKernel {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sent.push(buf.to_vec());
        Ok(buf.len())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.reads.is_empty() {
            return Ok(0);
        }
        match self.reads.remove(0) {
            Ok(bytes) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Err(e) => Err(e),
        }
    }
}

fn family_message(name: &str, id: u16, ops: &[(u16, u16)], groups: &[(u16, &str)]) -> Vec<u8> {
    let mut b = MessageBuilder::new(GENL_ID_CTRL, NLM_F_MULTI);
    b.append(&GenlMsgHdr::new(CtrlCmd::NewFamily as u8, 2));
    b.append_attr_u16(CtrlAttr::FamilyId as u16, id);
    b.append_attr_str(CtrlAttr::FamilyName as u16, name);
    b.append_attr_u16(CtrlAttr::Version as u16, 1);
    b.append_attr_u16(CtrlAttr::MaxAttr as u16, 8);

    if !ops.is_empty() {
        let nest = b.nest_start(CtrlAttr::Ops as u16);
        for (i, (op_id, flags)) in ops.iter().enumerate() {
            let item = b.nest_start(i as u16 + 1);
            b.append_attr_u16(CtrlAttrOp::Id as u16, *op_id);
            b.append_attr_u16(CtrlAttrOp::Flags as u16, *flags);
            b.nest_end(item);
        }
        b.nest_end(nest);
    }

    if !groups.is_empty() {
        let nest = b.nest_start(CtrlAttr::McastGroups as u16);
        for (i, (grp_id, grp_name)) in groups.iter().enumerate() {
            let item = b.nest_start(i as u16 + 1);
            b.append_attr_u16(CtrlAttrMcastGrp::Id as u16, *grp_id);
            b.append_attr_str(CtrlAttrMcastGrp::Name as u16, grp_name);
            b.nest_end(item);
        }
        b.nest_end(nest);
    }

    b.finish()
}

fn done_message() -> Vec<u8> {
    let mut b = MessageBuilder::new(NlMsgType::DONE, NLM_F_MULTI);
    b.append_bytes(&0i32.to_ne_bytes());
    b.finish()
}

fn error_message(code: i32) -> Vec<u8> {
    let mut b = MessageBuilder::new(NlMsgType::ERROR, 0);
    b.append_bytes(&code.to_ne_bytes());
    b.finish()
}

fn full_dump() -> Vec<u8> {
    let mut stream = family_message(
        "nlctrl",
        0x10,
        &[(3, 0x0e)],
        &[(0x10, "notify")],
    );
    stream.extend_from_slice(&family_message("wireguard", 0x1c, &[(0, 0x0b), (1, 0x0b)], &[]));
    stream.extend_from_slice(&done_message());
    stream
}

#[test]
fn dump_decodes_families_in_order() {
    let mut kernel = FakeKernel::new(vec![Ok(full_dump())]);
    let families = dump_families(&mut kernel).unwrap();

    assert_eq!(families.len(), 2);
    assert_eq!(families[0].name, "nlctrl");
    assert_eq!(families[0].id, 0x10);
    assert_eq!(families[0].operations.len(), 1);
    assert_eq!(families[0].operations[0].id, 3);
    assert_eq!(families[0].operations[0].flags, 0x0e);
    assert_eq!(families[0].groups.len(), 1);
    assert_eq!(families[0].groups[0].name, "notify");
    assert_eq!(families[0].groups[0].id, 0x10);

    assert_eq!(families[1].name, "wireguard");
    assert_eq!(families[1].operations.len(), 2);
    assert!(families[1].groups.is_empty());
}

#[test]
fn dump_sends_one_well_formed_request() {
    let mut kernel = FakeKernel::new(vec![Ok(full_dump())]);
    dump_families(&mut kernel).unwrap();

    assert_eq!(kernel.sent.len(), 1);
    let req = &kernel.sent[0];
    let header = NlMsgHdr::from_bytes(req).unwrap();
    assert_eq!(header.nlmsg_len as usize, req.len());
    assert_eq!(header.nlmsg_type, GENL_ID_CTRL);
    assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_ACK | NLM_F_DUMP);
    assert_eq!(header.nlmsg_pid, 0);

    let genl = GenlMsgHdr::from_bytes(&req[NLMSG_HDRLEN..]).unwrap();
    assert_eq!(genl.cmd, CtrlCmd::GetFamily as u8);
    assert_eq!(genl.version, 1);
}

#[test]
fn dump_split_across_reads_matches_single_read() {
    let stream = full_dump();
    let single = {
        let mut kernel = FakeKernel::new(vec![Ok(stream.clone())]);
        dump_families(&mut kernel).unwrap()
    };

    // Cut inside the second family message.
    let cut = stream.len() / 2;
    let split = {
        let mut kernel = FakeKernel::new(vec![
            Ok(stream[..cut].to_vec()),
            Ok(stream[cut..].to_vec()),
        ]);
        dump_families(&mut kernel).unwrap()
    };

    assert_eq!(single, split);
}

#[test]
fn dump_surfaces_kernel_error() {
    let mut kernel = FakeKernel::new(vec![Ok(error_message(-13))]);
    match dump_families(&mut kernel) {
        Err(Error::Kernel { errno, .. }) => assert_eq!(errno, 13),
        other => panic!("expected kernel error, got {:?}", other.map(|f| f.len())),
    }
}

#[test]
fn dump_surfaces_late_kernel_error() {
    let mut stream = family_message("nlctrl", 0x10, &[], &[]);
    stream.extend_from_slice(&error_message(-1));

    let mut kernel = FakeKernel::new(vec![Ok(stream)]);
    let err = dump_families(&mut kernel).unwrap_err();
    assert_eq!(err.errno(), Some(1));
    assert!(err.is_permission_denied());
}

#[test]
fn dump_treats_ack_as_clean_end() {
    let mut stream = family_message("nlctrl", 0x10, &[], &[]);
    stream.extend_from_slice(&error_message(0));

    let mut kernel = FakeKernel::new(vec![Ok(stream)]);
    let families = dump_families(&mut kernel).unwrap();
    assert_eq!(families.len(), 1);
}

#[test]
fn dump_propagates_read_failure() {
    let mut kernel = FakeKernel::new(vec![Err(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "sendto",
    ))]);
    assert!(matches!(dump_families(&mut kernel), Err(Error::Io(_))));
}
