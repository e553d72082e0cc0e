//! Human-readable labels shared by the CLI and the DOT export

use crate::graph::{AddressDetail, AddressKind, Edge};

/// Block explorer page for an address
pub const EXPLORER_URL_PREFIX: &str = "https://etherscan.io/address/";

pub const SELECTED_COLOR: &str = "red";
pub const ABNORMAL_COLOR: &str = "orange";
pub const NORMAL_COLOR: &str = "lightblue";

/// `# TXs: 3, Amt: 1.5ETH`
pub fn edge_label(edge: &Edge) -> String {
    format!("# TXs: {}, Amt: {}ETH", edge.count, edge.total_amount)
}

pub fn kind_label(kind: AddressKind) -> &'static str {
    match kind {
        AddressKind::Abnormal => "Abnormal Address",
        AddressKind::Normal => "Normal Address",
    }
}

pub fn explorer_url(id: &str) -> String {
    format!("{}{}", EXPLORER_URL_PREFIX, id)
}

pub fn node_color(kind: AddressKind, selected: bool) -> &'static str {
    if selected {
        return SELECTED_COLOR;
    }
    match kind {
        AddressKind::Abnormal => ABNORMAL_COLOR,
        AddressKind::Normal => NORMAL_COLOR,
    }
}

/// Received/sent lines; a direction with no transfers is left out.
pub fn detail_lines(detail: &AddressDetail) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if detail.num_received > 0 {
        lines.push(format!(
            "Received {} times, total {:.4} ETH",
            detail.num_received, detail.total_received
        ));
    }
    if detail.num_sent > 0 {
        lines.push(format!(
            "Sent {} times, total {:.4} ETH",
            detail.num_sent, detail.total_sent
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_label() {
        let edge = Edge {
            source: "0xa".into(),
            target: "0xb".into(),
            count: 12,
            total_amount: 0.5,
        };
        assert_eq!(edge_label(&edge), "# TXs: 12, Amt: 0.5ETH");
    }

    #[test]
    fn test_detail_lines_skip_zero_directions() {
        let detail = AddressDetail {
            total_received: 0.0,
            total_sent: 1.23456,
            num_received: 0,
            num_sent: 2,
        };
        assert_eq!(detail_lines(&detail), vec!["Sent 2 times, total 1.2346 ETH"]);
        assert!(detail_lines(&AddressDetail::default()).is_empty());
    }

    #[test]
    fn test_kind_and_color() {
        assert_eq!(kind_label(AddressKind::Abnormal), "Abnormal Address");
        assert_eq!(node_color(AddressKind::Normal, false), "lightblue");
        assert_eq!(node_color(AddressKind::Abnormal, true), "red");
        assert_eq!(explorer_url("0xab"), "https://etherscan.io/address/0xab");
    }
}
