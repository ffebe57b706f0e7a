//! Navigation targets exchanged between pages.
//!
//! Each page hands back a [`Route`] describing where to go next. The path
//! form (`/dashboard?profileId=p1`) is what `open` accepts on the command line.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Onboarding,
    Dashboard { profile_id: Option<String> },
    GrantDetail {
        grant_id: String,
        profile_id: Option<String>,
    },
    Packet {
        profile_id: String,
        grant_ids: Vec<String>,
    },
    Exit,
}

impl Route {
    pub fn dashboard(profile_id: Option<&str>) -> Self {
        Route::Dashboard {
            profile_id: non_empty(profile_id).map(str::to_string),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Scheme and host only anchor relative route text; they never appear in output.
const ROUTE_BASE: &str = "grant-match://app/";

fn route_url(segments: &[&str], query: &[(&str, &str)]) -> Option<Url> {
    let mut url = Url::parse(ROUTE_BASE).ok()?;
    url.path_segments_mut().ok()?.clear().extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Some(url)
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile_query = |id: &Option<String>| -> Vec<(&'static str, String)> {
            id.iter().map(|id| ("profileId", id.clone())).collect()
        };

        let (segments, query): (Vec<&str>, Vec<(&str, String)>) = match self {
            Route::Exit => return f.write_str("exit"),
            Route::Onboarding => (vec!["onboarding"], Vec::new()),
            Route::Dashboard { profile_id } => (vec!["dashboard"], profile_query(profile_id)),
            Route::GrantDetail {
                grant_id,
                profile_id,
            } => (vec!["grants", grant_id.as_str()], profile_query(profile_id)),
            Route::Packet {
                profile_id,
                grant_ids,
            } => {
                let mut query = vec![("profileId", profile_id.clone())];
                if !grant_ids.is_empty() {
                    query.push(("grantIds", grant_ids.join(",")));
                }
                (vec!["packets"], query)
            }
        };

        let query: Vec<(&str, &str)> = query
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        let url = route_url(&segments, &query).ok_or(fmt::Error)?;
        f.write_str(url.path())?;
        if let Some(query) = url.query() {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteParseError {
    #[error("unknown route '{0}'")]
    Unknown(String),
    #[error("route '{0}' requires a profileId parameter")]
    MissingProfileId(String),
}

impl FromStr for Route {
    type Err = RouteParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let unknown = || RouteParseError::Unknown(value.to_string());
        let url = Url::parse(ROUTE_BASE)
            .and_then(|base| base.join(value))
            .map_err(|_| unknown())?;

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };
        let profile_id = non_empty(param("profileId").as_deref()).map(str::to_string);
        let segments: Vec<String> = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(decode_segment)
                    .collect()
            })
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            ["onboarding"] => Ok(Route::Onboarding),
            [] | ["dashboard"] => Ok(Route::Dashboard { profile_id }),
            ["grants", grant_id] => Ok(Route::GrantDetail {
                grant_id: grant_id.to_string(),
                profile_id,
            }),
            ["packets"] => {
                let profile_id =
                    profile_id.ok_or_else(|| RouteParseError::MissingProfileId(value.to_string()))?;
                let grant_ids = param("grantIds")
                    .map(|ids| {
                        ids.split(',')
                            .filter(|id| !id.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Route::Packet {
                    profile_id,
                    grant_ids,
                })
            }
            _ => Err(unknown()),
        }
    }
}

/// Reverses the `%XX` escapes `Url` applies to path segments.
fn decode_segment(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let escaped = (bytes[index] == b'%')
            .then(|| segment.get(index + 1..index + 3))
            .flatten()
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                decoded.push(byte);
                index += 3;
            }
            None => {
                decoded.push(bytes[index]);
                index += 1;
            }
        }
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dashboard_with_and_without_identifier() {
        assert_eq!(
            "/dashboard?profileId=p1".parse::<Route>(),
            Ok(Route::Dashboard {
                profile_id: Some("p1".to_string())
            })
        );
        assert_eq!("/dashboard".parse::<Route>(), Ok(Route::Dashboard { profile_id: None }));
        assert_eq!(
            "/dashboard?profileId=".parse::<Route>(),
            Ok(Route::Dashboard { profile_id: None })
        );
    }

    #[test]
    fn grant_detail_keeps_back_identifier() {
        let route: Route = "/grants/g9?profileId=p2".parse().unwrap();
        assert_eq!(
            route,
            Route::GrantDetail {
                grant_id: "g9".to_string(),
                profile_id: Some("p2".to_string())
            }
        );
        assert_eq!(route.to_string(), "/grants/g9?profileId=p2");
    }

    #[test]
    fn packet_route_requires_identifier() {
        assert!(matches!(
            "/packets".parse::<Route>(),
            Err(RouteParseError::MissingProfileId(_))
        ));
        let route: Route = "/packets?profileId=p1&grantIds=g1,g2".parse().unwrap();
        assert_eq!(
            route,
            Route::Packet {
                profile_id: "p1".to_string(),
                grant_ids: vec!["g1".to_string(), "g2".to_string()]
            }
        );
    }

    #[test]
    fn rejects_unknown_paths() {
        assert!("/settings".parse::<Route>().is_err());
        assert!("/grants".parse::<Route>().is_err());
    }

    #[test]
    fn reserved_characters_survive_the_path_form() {
        let route = Route::GrantDetail {
            grant_id: "a/b?c#d".to_string(),
            profile_id: Some("p&1=2".to_string()),
        };

        let text = route.to_string();
        assert!(text.starts_with("/grants/a%2Fb%3Fc%23d?"));
        assert_eq!(text.parse::<Route>(), Ok(route));

        let packet = Route::Packet {
            profile_id: "p1".to_string(),
            grant_ids: vec!["g1".to_string(), "g 2".to_string()],
        };
        assert_eq!(packet.to_string().parse::<Route>(), Ok(packet));
    }

    #[test]
    fn query_values_are_percent_decoded() {
        assert_eq!(
            "/dashboard?profileId=p%201".parse::<Route>(),
            Ok(Route::Dashboard {
                profile_id: Some("p 1".to_string())
            })
        );
    }
}
