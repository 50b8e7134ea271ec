//! Provider construction from a connection string.
//!
//! ```text
//! tcp://host:61613
//! failover://(tcp://a:61613,tcp://b:61613)?randomize=true
//! ```

use url::form_urlencoded;

use super::host::{BrokerUri, Failover, HostProvider, SingleHost};
use crate::error::{Result, StompError};

const FAILOVER_SCHEME: &str = "failover:";

/// Build a host provider from a broker or failover URI.
///
/// `randomize` defaults to false; unknown query parameters are ignored.
pub fn provider_from_uri(uri: &str) -> Result<Box<dyn HostProvider>> {
    provider_from_uri_with_port(uri, crate::protocol::DEFAULT_PORT)
}

/// Like [`provider_from_uri`], with the port used when a URI names none.
pub fn provider_from_uri_with_port(uri: &str, default_port: u16) -> Result<Box<dyn HostProvider>> {
    let uri = uri.trim();
    let Some(rest) = strip_prefix_ignore_case(uri, FAILOVER_SCHEME) else {
        return Ok(Box::new(SingleHost::new(BrokerUri::parse_with_default_port(
            uri,
            default_port,
        )?)));
    };
    let rest = rest.strip_prefix("//").unwrap_or(rest);

    let (list, query) = match rest.strip_prefix('(') {
        Some(inner) => {
            let close = inner
                .find(')')
                .ok_or_else(|| StompError::InvalidUri(format!("{uri}: unbalanced parentheses")))?;
            (&inner[..close], &inner[close + 1..])
        }
        None => match rest.find('?') {
            Some(mark) => (&rest[..mark], &rest[mark..]),
            None => (rest, ""),
        },
    };

    let hosts = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| BrokerUri::parse_with_default_port(s, default_port))
        .collect::<Result<Vec<_>>>()?;
    if hosts.is_empty() {
        return Err(StompError::InvalidUri(format!("{uri}: no brokers listed")));
    }

    let randomize = query
        .strip_prefix('?')
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .any(|(k, v)| k == "randomize" && v.eq_ignore_ascii_case("true"))
        })
        .unwrap_or(false);

    tracing::debug!(
        "Failover provider over {} brokers (randomize={})",
        hosts.len(),
        randomize
    );

    Ok(if randomize {
        Box::new(Failover::randomized(hosts))
    } else {
        Box::new(Failover::ordered(hosts))
    })
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(provider: &dyn HostProvider, n: usize) -> Vec<String> {
        provider.hosts().take(n).map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_plain_uri_is_single_host() {
        let provider = provider_from_uri("tcp://localhost").unwrap();
        assert_eq!(
            hosts(provider.as_ref(), 2),
            ["tcp://localhost:61613", "tcp://localhost:61613"]
        );
    }

    #[test]
    fn test_failover_ordered_by_default() {
        let provider = provider_from_uri("failover://(tcp://a:1,tcp://b:2, tcp://c)").unwrap();
        assert_eq!(
            hosts(provider.as_ref(), 4),
            ["tcp://a:1", "tcp://b:2", "tcp://c:61613", "tcp://a:1"]
        );
    }

    #[test]
    fn test_failover_randomize_false() {
        let provider = provider_from_uri("failover://(tcp://a:1,tcp://b:2)?randomize=false").unwrap();
        assert_eq!(hosts(provider.as_ref(), 2), ["tcp://a:1", "tcp://b:2"]);
    }

    #[test]
    fn test_failover_randomize_true_keeps_members() {
        let provider =
            provider_from_uri("failover:(tcp://a:1,tcp://b:2,tcp://c:3)?randomize=true").unwrap();
        let mut seen = hosts(provider.as_ref(), 3);
        // Order is fixed once per provider
        assert_eq!(seen, hosts(provider.as_ref(), 3));
        seen.sort();
        assert_eq!(seen, ["tcp://a:1", "tcp://b:2", "tcp://c:3"]);
    }

    #[test]
    fn test_failover_without_parentheses() {
        let provider = provider_from_uri("failover://tcp://a:1,tcp://b:2?randomize=false").unwrap();
        assert_eq!(hosts(provider.as_ref(), 2), ["tcp://a:1", "tcp://b:2"]);
    }

    #[test]
    fn test_custom_default_port() {
        let provider = provider_from_uri_with_port("failover://(tcp://a)", 7000).unwrap();
        assert_eq!(hosts(provider.as_ref(), 1), ["tcp://a:7000"]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            provider_from_uri("failover://(tcp://a:1"),
            Err(StompError::InvalidUri(_))
        ));
        assert!(matches!(
            provider_from_uri("failover://()"),
            Err(StompError::InvalidUri(_))
        ));
        assert!(provider_from_uri("failover://(bogus)").is_err());
    }
}
