use tgn_core::{ChannelNumber, NodeId, SectorId};
use tgn_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel model configuration error: {0}")]
    Config(String),

    #[error("profile error: {0}")]
    Model(#[from] ModelError),

    #[error("node {0} has no registered channel model interface")]
    UnknownNode(NodeId),

    #[error("{sector} of {node} has no registered channel model interface")]
    UnknownSector { node: NodeId, sector: SectorId },

    #[error("{channel} is not configured (base {base}, {count} channels)")]
    UnknownChannel {
        channel: ChannelNumber,
        base:    ChannelNumber,
        count:   usize,
    },

    #[error("subcarrier {index} out of range ({count} subcarriers)")]
    SubcarrierOutOfRange { index: usize, count: usize },

    #[error("antenna config parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChannelResult<T> = Result<T, ChannelError>;
