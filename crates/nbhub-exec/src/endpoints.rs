use urlencoding::encode;

/// URL table for the REST backend. Resource routes live under
/// `/v1/{namespace}/`; auth routes sit at the root. Caller-supplied
/// segments are percent-encoded so they cannot reshape the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn v1(&self, namespace: &str, path: &str) -> String {
        format!("{}/v1/{}/{path}", self.base, encode(namespace))
    }

    pub fn login(&self) -> String {
        format!("{}/auth/jwt-token-auth/", self.base)
    }

    pub fn token_exchange(&self) -> String {
        format!("{}/auth/token-exchange/", self.base)
    }

    pub fn register(&self) -> String {
        format!("{}/auth/register/", self.base)
    }

    pub fn reset_password(&self) -> String {
        format!("{}/auth/password/reset/", self.base)
    }

    pub fn projects(&self, namespace: &str) -> String {
        self.v1(namespace, "projects/")
    }

    pub fn project(&self, namespace: &str, project_id: &str) -> String {
        self.v1(namespace, &format!("projects/{}/", encode(project_id)))
    }

    pub fn servers(&self, namespace: &str, project_id: &str) -> String {
        self.v1(namespace, &format!("projects/{}/servers/", encode(project_id)))
    }

    pub fn server(&self, namespace: &str, project_id: &str, server_id: &str) -> String {
        self.v1(
            namespace,
            &format!(
                "projects/{}/servers/{}/",
                encode(project_id),
                encode(server_id)
            ),
        )
    }

    pub fn server_start(&self, namespace: &str, project_id: &str, server_id: &str) -> String {
        format!("{}start/", self.server(namespace, project_id, server_id))
    }

    pub fn server_stop(&self, namespace: &str, project_id: &str, server_id: &str) -> String {
        format!("{}stop/", self.server(namespace, project_id, server_id))
    }

    pub fn server_status(&self, namespace: &str, project_id: &str, server_id: &str) -> String {
        format!("{}status/", self.server(namespace, project_id, server_id))
    }

    pub fn project_files(&self, namespace: &str, project_id: &str) -> String {
        self.v1(
            namespace,
            &format!("projects/{}/project_files/", encode(project_id)),
        )
    }

    pub fn teams(&self, namespace: &str) -> String {
        self.v1(namespace, "teams/")
    }

    pub fn profile(&self, namespace: &str) -> String {
        self.v1(namespace, "users/profile/")
    }

    pub fn applications(&self, namespace: &str) -> String {
        self.v1(namespace, "applications/")
    }

    pub fn application(&self, namespace: &str, application_id: &str) -> String {
        self.v1(namespace, &format!("applications/{}/", encode(application_id)))
    }

    pub fn cards(&self, namespace: &str) -> String {
        self.v1(namespace, "billing/cards/")
    }

    pub fn card(&self, namespace: &str, card_id: &str) -> String {
        self.v1(namespace, &format!("billing/cards/{}/", encode(card_id)))
    }

    pub fn subscription(&self, namespace: &str) -> String {
        self.v1(namespace, "billing/subscription/")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builds_versioned_resource_urls() {
        let endpoints = Endpoints::new("https://api.example.com/");
        assert_eq!(endpoints.login(), "https://api.example.com/auth/jwt-token-auth/");
        assert_eq!(
            endpoints.projects("alice"),
            "https://api.example.com/v1/alice/projects/"
        );
        assert_eq!(
            endpoints.server_start("alice", "p1", "s1"),
            "https://api.example.com/v1/alice/projects/p1/servers/s1/start/"
        );
        assert_eq!(
            endpoints.project_files("alice", "p1"),
            "https://api.example.com/v1/alice/projects/p1/project_files/"
        );
    }

    #[test]
    fn segments_are_percent_encoded() {
        let endpoints = Endpoints::new("https://api.example.com");
        assert_eq!(
            endpoints.project("al ice", "../teams?x=1"),
            "https://api.example.com/v1/al%20ice/projects/..%2Fteams%3Fx%3D1/"
        );
        assert_eq!(
            endpoints.server_stop("alice", "p/1", "s#2"),
            "https://api.example.com/v1/alice/projects/p%2F1/servers/s%232/stop/"
        );
        assert_eq!(
            endpoints.card("alice", "card_1"),
            "https://api.example.com/v1/alice/billing/cards/card_1/"
        );
    }
}
