use std::io::Write;
use std::sync::Arc;

use hibp_range::{BreachMatcher, CheckToken, Event, RangeQuery, Session};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Error;
use crate::report::breach_message;

/// Drives a [`Session`] from lines of `input`, one line per password change.
///
/// Checks run as spawned tasks and report back over a channel, so a new line
/// can arrive while older checks are still in flight. Their late results are
/// dropped by the session. The shown state is written to `out` after every
/// change that affects it. Returns once input is exhausted and every issued
/// check has answered.
pub async fn watch<Q, R, W>(query: Arc<Q>, input: R, out: &mut W) -> Result<Session, Error>
where
    Q: RangeQuery + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut lines = input.lines();
    let mut session = Session::default();
    let mut input_open = true;
    let mut in_flight = 0usize;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(password) = line? else {
                    input_open = false;
                    continue;
                };

                session = session.apply(Event::PasswordChanged(password));
                if let Some((token, password)) = session.pending_check() {
                    spawn_check(&query, token, password.to_owned(), tx.clone());
                    in_flight += 1;
                }
                render(&session, out)?;
            }
            Some(event) = rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                let before = session.breach().clone();
                session = session.apply(event);
                if *session.breach() != before {
                    render(&session, out)?;
                }
            }
            else => break,
        }
    }

    Ok(session)
}

fn spawn_check<Q>(
    query: &Arc<Q>,
    token: CheckToken,
    password: String,
    tx: mpsc::UnboundedSender<Event>,
) where
    Q: RangeQuery + Send + Sync + 'static,
{
    let query = Arc::clone(query);
    tokio::spawn(async move {
        debug!(%token, "breach check started");
        let event = match BreachMatcher::new(&*query).check_password(&password).await {
            Ok(result) => Event::RangeQueryResolved(token, result),
            Err(err) => Event::RangeQueryFailed(token, err),
        };
        // The receiver is gone only if the session already ended.
        let _ = tx.send(event);
    });
}

fn render<W: Write>(session: &Session, out: &mut W) -> std::io::Result<()> {
    let token = session.latest_token();
    let Some(rating) = session.rating() else {
        return writeln!(out, "[{token}] (empty)");
    };

    write!(out, "[{token}] Strength: {rating}")?;
    if let Some(message) = breach_message(session.breach()) {
        write!(out, " | {message}")?;
    }
    writeln!(out)?;

    for suggestion in session.suggestions() {
        writeln!(out, "  - {suggestion}")?;
    }
    Ok(())
}
