use wire::Channel;

/// One message pulled off the bus: the parsed channel it arrived on, plus
/// the raw JSON payload string (decoding is the caller's job -- different
/// channels carry different payload shapes).
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub channel: Channel,
    pub payload: String,
}
