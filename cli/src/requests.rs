use std::sync::PoisonError;

use canvas::{SharedCanvas, WriteOutcome};
use structures::BUFFER_LEN;
use thiserror::Error;

// Longer tokens can't be sensible numbers
const MAX_TOKEN_LEN: usize = 24;

fn help(cooldown_seconds: f64) -> String {
    format!(
        "This is a shared QOI image body of {} bytes. Everyone may set one byte every {cooldown_seconds} seconds, and a new frame is published every now and then.\n\
         <caller> <offset> <value>  set byte <offset> (0 to {}) to <value> (0 to 255)\n\
         !ban CALLER [SECONDS]      block a caller\n\
         !null OFFSET               zero a byte, ignoring cooldowns\n\
         !pardon CALLER             reset the cooldown of a caller\n\
         !stats                     show usage numbers\n\
         !help                      show this text",
        BUFFER_LEN,
        BUFFER_LEN - 1
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Write {
        caller: String,
        offset: usize,
        value: u8,
    },
    Ban {
        caller: String,
        seconds: Option<f64>,
    },
    Null {
        offset: usize,
    },
    Pardon {
        caller: String,
    },
    Stats,
    Help,
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("I can't interpret that. Send something like \"alice 456789 123\" to set byte 456789 to 123, or !help.")]
    Unparsable,
    #[error("The offset must lie within the buffer of {} bytes, so {0} won't work.", BUFFER_LEN)]
    InvalidOffset(i64),
    #[error("The value must be between 0 and 255 inclusively, so {0} won't work.")]
    InvalidValue(i64),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

fn number(token: &str) -> Result<i64, RequestError> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(RequestError::Unparsable);
    }
    token.parse().map_err(|_| RequestError::Unparsable)
}

fn offset(token: &str) -> Result<usize, RequestError> {
    let offset = number(token)?;
    if !(0..BUFFER_LEN as i64).contains(&offset) {
        return Err(RequestError::InvalidOffset(offset));
    }
    Ok(offset as usize)
}

fn value(token: &str) -> Result<u8, RequestError> {
    let value = number(token)?;
    u8::try_from(value).map_err(|_| RequestError::InvalidValue(value))
}

/// Parses one line of the request protocol.
///
/// `<caller> <offset> <value>` writes a byte; admin requests start with `!`.
pub fn parse(line: &str) -> Result<Request, RequestError> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        ["!ban", caller] => Ok(Request::Ban {
            caller: caller.to_string(),
            seconds: None,
        }),
        ["!ban", caller, seconds] => Ok(Request::Ban {
            caller: caller.to_string(),
            seconds: Some(number(seconds)? as f64),
        }),
        ["!ban", ..] => Err(RequestError::Usage("!ban CALLER [SECONDS]")),
        ["!null", offset_token] => Ok(Request::Null {
            offset: offset(offset_token)?,
        }),
        ["!null", ..] => Err(RequestError::Usage("!null OFFSET")),
        ["!pardon", caller] => Ok(Request::Pardon {
            caller: caller.to_string(),
        }),
        ["!pardon", ..] => Err(RequestError::Usage("!pardon CALLER")),
        ["!stats"] => Ok(Request::Stats),
        ["!help", ..] => Ok(Request::Help),
        [caller, offset_token, value_token] if !caller.starts_with('!') => Ok(Request::Write {
            caller: caller.to_string(),
            offset: offset(offset_token)?,
            value: value(value_token)?,
        }),
        _ => Err(RequestError::Unparsable),
    }
}

/// Applies a request to the canvas and phrases the reply.
pub fn handle(canvas: &SharedCanvas, request: Request) -> String {
    let mut canvas = canvas.lock().unwrap_or_else(PoisonError::into_inner);

    match request {
        Request::Write {
            caller,
            offset,
            value,
        } => match canvas.write(offset, value, &caller) {
            Ok(WriteOutcome::Accepted) => {
                format!("Done, {caller}! You should see the result in the next frame.")
            }
            Ok(WriteOutcome::RateLimited { remaining }) => format!(
                "Sorry, you should have waited {remaining:.2} more seconds. Timeout has been reset to at least {} seconds.",
                canvas.config().cooldown_seconds
            ),
            Err(err) => err.to_string(),
        },
        Request::Ban { caller, seconds } => {
            let seconds = seconds.unwrap_or(canvas.config().default_ban_seconds);
            canvas.ban(&caller, seconds);
            format!("Caller banned. New stats: {}", canvas.stats())
        }
        Request::Null { offset } => match canvas.force_clear(offset) {
            Ok(()) => "Done".to_string(),
            Err(err) => format!("Failed! Error: {err}"),
        },
        Request::Pardon { caller } => {
            canvas.pardon(&caller);
            "Reset".to_string()
        }
        Request::Stats => format!("Current stats: {}", canvas.stats()),
        Request::Help => help(canvas.config().cooldown_seconds),
    }
}
