//! Hierarchical request router with longest-prefix sub-router delegation.
//! Handlers are opaque; nothing here touches storage and the registry never
//! touches this.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn parse(s: &str) -> Option<Method> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "PUT" => Some(Method::Put),
            "POST" => Some(Method::Post),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

pub struct Router<H> {
    not_found: H,
    routes: HashMap<String, HashMap<Method, H>>,
    mounts: Vec<(String, Router<H>)>,
}

impl<H> Router<H> {
    pub fn new(not_found: H) -> Self {
        Router {
            not_found,
            routes: HashMap::new(),
            mounts: Vec::new(),
        }
    }

    /// Mount a sub-router under a path prefix. On match the prefix is
    /// stripped before delegation; the longest matching prefix wins.
    pub fn mount(&mut self, prefix: impl Into<String>, router: Router<H>) -> &mut Self {
        self.mounts.push((prefix.into(), router));
        self
    }

    pub fn route(&mut self, method: Method, path: impl Into<String>, handler: H) -> &mut Self {
        self.routes
            .entry(path.into())
            .or_default()
            .insert(method, handler);
        self
    }

    pub fn get(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.route(Method::Get, path, handler)
    }

    pub fn put(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.route(Method::Put, path, handler)
    }

    pub fn post(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.route(Method::Post, path, handler)
    }

    pub fn patch(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.route(Method::Patch, path, handler)
    }

    pub fn delete(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.route(Method::Delete, path, handler)
    }

    /// Resolve a handler. Sub-routers are consulted first, longest matching
    /// mount prefix winning; otherwise an exact method+path route; otherwise
    /// this router's not_found.
    pub fn match_route(&self, path: &str, method: Method) -> &H {
        let mut best: Option<(&str, &Router<H>)> = None;
        for (prefix, sub) in &self.mounts {
            if strip_mount(path, prefix).is_some() {
                let longer = best.map_or(true, |(b, _)| prefix.len() > b.len());
                if longer {
                    best = Some((prefix, sub));
                }
            }
        }
        if let Some((prefix, sub)) = best {
            let rest = strip_mount(path, prefix).unwrap_or("/");
            return sub.match_route(rest, method);
        }
        self.routes
            .get(path)
            .and_then(|by_method| by_method.get(&method))
            .unwrap_or(&self.not_found)
    }
}

/// Path-boundary prefix strip: "/auth/login" under "/auth" leaves
/// "/login"; "/authx" does not match "/auth". The remainder always starts
/// with '/'.
fn strip_mount<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some("/");
    }
    rest.starts_with('/').then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Router<&'static str> {
        let mut auth = Router::new("auth-404");
        auth.get("/login", "login").post("/session", "new-session");

        let mut magic = Router::new("magic-404");
        magic.get("/start", "magic-start");

        let mut root = Router::new("404");
        root.get("/", "home").post("/", "graphql");
        root.mount("/auth", auth);
        root.mount("/auth/magic", magic);
        root
    }

    #[test]
    fn exact_routes_dispatch_by_method() {
        let router = sample();
        assert_eq!(*router.match_route("/", Method::Get), "home");
        assert_eq!(*router.match_route("/", Method::Post), "graphql");
        assert_eq!(*router.match_route("/", Method::Delete), "404");
    }

    #[test]
    fn mounted_router_sees_the_stripped_path() {
        let router = sample();
        assert_eq!(*router.match_route("/auth/login", Method::Get), "login");
        assert_eq!(
            *router.match_route("/auth/session", Method::Post),
            "new-session"
        );
    }

    #[test]
    fn longest_prefix_wins() {
        let router = sample();
        assert_eq!(
            *router.match_route("/auth/magic/start", Method::Get),
            "magic-start"
        );
    }

    #[test]
    fn prefix_match_respects_path_boundaries() {
        let router = sample();
        assert_eq!(*router.match_route("/authx", Method::Get), "404");
    }

    #[test]
    fn unmatched_paths_inside_a_mount_use_its_not_found() {
        let router = sample();
        assert_eq!(*router.match_route("/auth/nope", Method::Get), "auth-404");
    }

    #[test]
    fn method_names_parse_case_insensitively() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("PATCH"), Some(Method::Patch));
        assert_eq!(Method::parse("BREW"), None);
    }
}
