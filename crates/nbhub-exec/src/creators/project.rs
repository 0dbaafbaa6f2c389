use serde::Deserialize;

use nbhub_core::models::Project;
use nbhub_core::models::ProjectFile;
use nbhub_core::models::Server;
use nbhub_core::models::ServerStatus;
use nbhub_core::models::ServerStatusReport;
use nbhub_core::models::WorkspaceKind;
use nbhub_core::routes::HOME_ROUTE;
use nbhub_core::ProjectAction;

use super::AppContext;
use super::Outcome;
use crate::client::HttpClient;
use crate::contracts::ApiResponse;
use crate::contracts::MultipartFile;
use crate::contracts::NewServer;
use crate::contracts::ProjectUpdate;
use crate::contracts::RequestDescriptor;

#[derive(Deserialize)]
struct StatusBody {
    status: ServerStatus,
}

impl<C: HttpClient> AppContext<C> {
    pub async fn fetch_project(&self, namespace: &str, project_id: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.project(namespace, project_id));
        let project = self
            .call(
                ProjectAction::FetchProject,
                request,
                ApiResponse::decode::<Project>,
            )
            .await;
        Outcome::of(&project)
    }

    pub async fn update_project(
        &self,
        namespace: &str,
        project_id: &str,
        update: ProjectUpdate,
    ) -> Outcome {
        let request =
            RequestDescriptor::patch_json(self.endpoints.project(namespace, project_id), &update);
        let project = self
            .call(
                ProjectAction::UpdateProject,
                request,
                ApiResponse::decode::<Project>,
            )
            .await;
        Outcome::of(&project)
    }

    pub async fn delete_project(&self, namespace: &str, project_id: &str) -> Outcome {
        let request = RequestDescriptor::delete(self.endpoints.project(namespace, project_id));
        let deleted = self
            .call(ProjectAction::DeleteProject, request, |_| {
                Ok(project_id.to_string())
            })
            .await;
        if deleted.is_some() {
            self.navigate(HOME_ROUTE);
        }
        Outcome::of(&deleted)
    }

    pub async fn fetch_servers(&self, namespace: &str, project_id: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.servers(namespace, project_id));
        let servers = self
            .call(
                ProjectAction::FetchServers,
                request,
                ApiResponse::decode::<Vec<Server>>,
            )
            .await;
        Outcome::of(&servers)
    }

    /// Creates a server from the image configured for `kind`, then reloads
    /// the server list.
    pub async fn add_server(
        &self,
        namespace: &str,
        project_id: &str,
        name: &str,
        kind: WorkspaceKind,
    ) -> Outcome {
        let body = NewServer {
            name: name.to_string(),
            image_name: self.config.images.image_for(kind).to_string(),
        };
        let request =
            RequestDescriptor::post_json(self.endpoints.servers(namespace, project_id), &body);
        let server = self
            .call(ProjectAction::AddServer, request, ApiResponse::decode::<Server>)
            .await;
        if server.is_some() {
            self.fetch_servers(namespace, project_id).await;
        }
        Outcome::of(&server)
    }

    pub async fn start_server(&self, namespace: &str, project_id: &str, server_id: &str) -> Outcome {
        let request =
            RequestDescriptor::post(self.endpoints.server_start(namespace, project_id, server_id));
        let started = self
            .call(ProjectAction::StartServer, request, |_| {
                Ok(server_id.to_string())
            })
            .await;
        if started.is_some() {
            self.fetch_servers(namespace, project_id).await;
        }
        Outcome::of(&started)
    }

    pub async fn stop_server(&self, namespace: &str, project_id: &str, server_id: &str) -> Outcome {
        let request =
            RequestDescriptor::post(self.endpoints.server_stop(namespace, project_id, server_id));
        let stopped = self
            .call(ProjectAction::StopServer, request, |_| {
                Ok(server_id.to_string())
            })
            .await;
        if stopped.is_some() {
            self.fetch_servers(namespace, project_id).await;
        }
        Outcome::of(&stopped)
    }

    pub async fn fetch_server_status(
        &self,
        namespace: &str,
        project_id: &str,
        server_id: &str,
    ) -> Outcome {
        let request =
            RequestDescriptor::get(self.endpoints.server_status(namespace, project_id, server_id));
        let report = self
            .call(ProjectAction::FetchServerStatus, request, |response| {
                let body = response.decode::<StatusBody>()?;
                Ok(ServerStatusReport {
                    id: server_id.to_string(),
                    status: body.status,
                })
            })
            .await;
        Outcome::of(&report)
    }

    pub async fn delete_server(&self, namespace: &str, project_id: &str, server_id: &str) -> Outcome {
        let request =
            RequestDescriptor::delete(self.endpoints.server(namespace, project_id, server_id));
        let deleted = self
            .call(ProjectAction::DeleteServer, request, |_| {
                Ok(server_id.to_string())
            })
            .await;
        Outcome::of(&deleted)
    }

    pub async fn fetch_files(&self, namespace: &str, project_id: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.project_files(namespace, project_id));
        let files = self
            .call(
                ProjectAction::FetchFiles,
                request,
                ApiResponse::decode::<Vec<ProjectFile>>,
            )
            .await;
        Outcome::of(&files)
    }

    pub async fn upload_files(
        &self,
        namespace: &str,
        project_id: &str,
        files: Vec<MultipartFile>,
    ) -> Outcome {
        let request = RequestDescriptor::post(self.endpoints.project_files(namespace, project_id))
            .multipart(files);
        let uploaded = self
            .call(
                ProjectAction::UploadFiles,
                request,
                ApiResponse::decode_many::<ProjectFile>,
            )
            .await;
        if uploaded.is_some() {
            self.fetch_files(namespace, project_id).await;
        }
        Outcome::of(&uploaded)
    }
}
