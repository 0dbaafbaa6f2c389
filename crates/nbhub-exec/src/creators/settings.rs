use nbhub_core::models::BillingCard;
use nbhub_core::models::OAuthApplication;
use nbhub_core::models::Subscription;
use nbhub_core::models::UserProfile;
use nbhub_core::SettingsAction;

use super::AppContext;
use super::Outcome;
use crate::client::HttpClient;
use crate::contracts::ApiResponse;
use crate::contracts::NewApplication;
use crate::contracts::NewCard;
use crate::contracts::ProfileUpdate;
use crate::contracts::RequestDescriptor;

impl<C: HttpClient> AppContext<C> {
    pub async fn fetch_profile(&self, namespace: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.profile(namespace));
        let profile = self
            .call(
                SettingsAction::FetchProfile,
                request,
                ApiResponse::decode::<UserProfile>,
            )
            .await;
        Outcome::of(&profile)
    }

    pub async fn update_profile(&self, namespace: &str, update: ProfileUpdate) -> Outcome {
        let request = RequestDescriptor::patch_json(self.endpoints.profile(namespace), &update);
        let profile = self
            .call(
                SettingsAction::UpdateProfile,
                request,
                ApiResponse::decode::<UserProfile>,
            )
            .await;
        Outcome::of(&profile)
    }

    pub async fn fetch_applications(&self, namespace: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.applications(namespace));
        let applications = self
            .call(
                SettingsAction::FetchApplications,
                request,
                ApiResponse::decode::<Vec<OAuthApplication>>,
            )
            .await;
        Outcome::of(&applications)
    }

    pub async fn add_application(&self, namespace: &str, application: NewApplication) -> Outcome {
        let request =
            RequestDescriptor::post_json(self.endpoints.applications(namespace), &application);
        let created = self
            .call(
                SettingsAction::AddApplication,
                request,
                ApiResponse::decode::<OAuthApplication>,
            )
            .await;
        Outcome::of(&created)
    }

    pub async fn delete_application(&self, namespace: &str, application_id: &str) -> Outcome {
        let request =
            RequestDescriptor::delete(self.endpoints.application(namespace, application_id));
        let deleted = self
            .call(SettingsAction::DeleteApplication, request, |_| {
                Ok(application_id.to_string())
            })
            .await;
        Outcome::of(&deleted)
    }

    pub async fn fetch_cards(&self, namespace: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.cards(namespace));
        let cards = self
            .call(
                SettingsAction::FetchCards,
                request,
                ApiResponse::decode::<Vec<BillingCard>>,
            )
            .await;
        Outcome::of(&cards)
    }

    pub async fn add_card(&self, namespace: &str, card: NewCard) -> Outcome {
        let request = RequestDescriptor::post_json(self.endpoints.cards(namespace), &card);
        let created = self
            .call(
                SettingsAction::AddCard,
                request,
                ApiResponse::decode::<BillingCard>,
            )
            .await;
        Outcome::of(&created)
    }

    pub async fn delete_card(&self, namespace: &str, card_id: &str) -> Outcome {
        let request = RequestDescriptor::delete(self.endpoints.card(namespace, card_id));
        let deleted = self
            .call(SettingsAction::DeleteCard, request, |_| {
                Ok(card_id.to_string())
            })
            .await;
        Outcome::of(&deleted)
    }

    pub async fn fetch_subscription(&self, namespace: &str) -> Outcome {
        let request = RequestDescriptor::get(self.endpoints.subscription(namespace));
        let subscription = self
            .call(
                SettingsAction::FetchSubscription,
                request,
                ApiResponse::decode::<Subscription>,
            )
            .await;
        Outcome::of(&subscription)
    }
}
