use crate::{Command, FetchError, Report, ReportKind, SendError};
use futures::future::BoxFuture;
#[cfg(test)]
use futures::FutureExt;

/// Something that can look up weather reports.
pub trait Weather: Send + Sync {
    fn fetch<'a>(
        &'a self,
        kind: ReportKind,
        code: &'a str,
    ) -> BoxFuture<'a, Result<Report, FetchError>>;

    fn fetch_metar<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Report, FetchError>> {
        self.fetch(ReportKind::Metar, code)
    }

    fn fetch_taf<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Report, FetchError>> {
        self.fetch(ReportKind::Taf, code)
    }
}

/// Something that can deliver a text message.
pub trait Messenger: Send + Sync {
    fn send_message<'a>(
        &'a self,
        to: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), SendError>>;
}

/// Answer one command: fetch what it asks for and text the result back to `to`.
///
/// Failures are logged and never reported to the sender. When nothing could be fetched, no
/// message is sent at all.
pub async fn handle<W, M>(command: &Command, weather: &W, messenger: &M, to: &str)
where
    W: Weather + ?Sized,
    M: Messenger + ?Sized,
{
    let metar = if command.wants_metar {
        fetched(weather.fetch_metar(&command.code).await)
    } else {
        None
    };

    let taf = if command.wants_taf {
        fetched(weather.fetch_taf(&command.code).await)
    } else {
        None
    };

    let body = match assemble(metar.as_ref(), taf.as_ref()) {
        Some(body) => body,
        None => {
            log::info!("nothing to send for {:?}", command.code);
            return;
        }
    };

    log::debug!("sending to {}: {:?}", to, body);
    if let Err(e) = messenger.send_message(to, &body).await {
        log::error!("failed to send reply to {}: {}", to, e);
    }
}

fn fetched(result: Result<Report, FetchError>) -> Option<Report> {
    result.map_err(|e| log::warn!("fetch failed: {}", e)).ok()
}

/// Build the reply text: the METAR, then a blank line, then the TAF.
pub fn assemble(metar: Option<&Report>, taf: Option<&Report>) -> Option<String> {
    match (metar, taf) {
        (Some(metar), Some(taf)) => Some(format!("{}\n\n{}", metar.content, taf.content)),
        (Some(metar), None) => Some(metar.content.clone()),
        (None, Some(taf)) => Some(taf.content.clone()),
        (None, None) => None,
    }
}

/// A [`Weather`] which answers from fixed reports, failing for any kind it has none of.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct FixedWeather {
    pub(crate) metar: Option<String>,
    pub(crate) taf: Option<String>,
}

#[cfg(test)]
impl Weather for FixedWeather {
    fn fetch<'a>(
        &'a self,
        kind: ReportKind,
        code: &'a str,
    ) -> BoxFuture<'a, Result<Report, FetchError>> {
        let content = match kind {
            ReportKind::Metar => self.metar.clone(),
            ReportKind::Taf => self.taf.clone(),
        };
        let result = content
            .map(|content| Report {
                kind,
                code: code.to_string(),
                content,
            })
            .ok_or_else(|| FetchError::NotFound {
                kind,
                code: code.to_string(),
                detail: "no fixed report".to_string(),
            });
        futures::future::ready(result).boxed()
    }
}
