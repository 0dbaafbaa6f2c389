use nbhub_core::models::Project;
use nbhub_core::models::Team;
use nbhub_core::routes::project_path;
use nbhub_core::HomeAction;

use super::AppContext;
use super::Outcome;
use crate::client::HttpClient;
use crate::contracts::ApiResponse;
use crate::contracts::NewProject;
use crate::contracts::NewTeam;
use crate::contracts::RequestDescriptor;

impl<C: HttpClient> AppContext<C> {
    pub async fn fetch_projects(&self, namespace: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.projects(namespace));
        let projects = self
            .call(
                HomeAction::FetchProjects,
                request,
                ApiResponse::decode::<Vec<Project>>,
            )
            .await;
        Outcome::of(&projects)
    }

    /// Creates a project and opens it.
    pub async fn add_project(&self, namespace: &str, project: NewProject) -> Outcome {
        let request = RequestDescriptor::post_json(self.endpoints.projects(namespace), &project);
        let created = self
            .call(HomeAction::AddProject, request, ApiResponse::decode::<Project>)
            .await;
        if let Some(created) = &created {
            self.navigate(project_path(namespace, &created.id));
        }
        Outcome::of(&created)
    }

    pub async fn fetch_teams(&self, namespace: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.teams(namespace));
        let teams = self
            .call(HomeAction::FetchTeams, request, ApiResponse::decode::<Vec<Team>>)
            .await;
        Outcome::of(&teams)
    }

    pub async fn add_team(&self, namespace: &str, team: NewTeam) -> Outcome {
        let request = RequestDescriptor::post_json(self.endpoints.teams(namespace), &team);
        let created = self
            .call(HomeAction::AddTeam, request, ApiResponse::decode::<Team>)
            .await;
        Outcome::of(&created)
    }
}
