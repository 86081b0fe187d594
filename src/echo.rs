//! String echo session used by the `echo` command.

use crate::net::{NetError, Stream, Transport};

/// Echo strings back until the peer hangs up between messages.
///
/// Returns the number of strings echoed. A declared length of
/// `max_message` or more ends the session with [`NetError::Oversized`].
pub fn echo_session<T: Transport>(
    stream: &mut Stream<T>,
    max_message: usize,
) -> Result<usize, NetError> {
    let mut echoed = 0;
    loop {
        let message = match stream.read_str_bounded(max_message) {
            Ok(message) => message,
            Err(NetError::Closed { received: 0, .. }) => break,
            Err(e) => {
                tracing::warn!(connection_id = %stream.id(), error = %e, "Echo session aborted");
                return Err(e);
            }
        };
        tracing::debug!(connection_id = %stream.id(), %message, "Echo");
        stream.write_string(&message)?;
        echoed += 1;
    }

    tracing::info!(connection_id = %stream.id(), echoed, "Echo session ended");
    Ok(echoed)
}
