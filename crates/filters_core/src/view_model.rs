use crate::RequestId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageView {
    pub location: String,
    pub section_id: Option<String>,
    pub history_len: usize,
    pub history_index: usize,
    pub in_flight: usize,
    pub last_issued: RequestId,
    pub renders_applied: u64,
    pub dirty: bool,
}
