// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{GenericImageView, Rgba};

use crate::backends::local::transform::tests::png;
use crate::backends::local::{InferenceSession, ModelLoader};
use crate::backends::remote::RemoteBackend;
use crate::backends::stub::{resolved, DelayedProvider, HangingProvider};
use crate::backends::{Backends, ProviderFactory};
use crate::config::{Config, Credentials};
use crate::engine::{Job, OutcomeStatus, PipelineComposer, ResultSelector, ShotgunDispatcher};
use crate::errors::ProviderError;

/// End-to-end tests across registry, dispatcher, pipeline and selector
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_five_provider_shotgun_with_timeout_and_cancellation() {
        let providers = vec![
            resolved("fast", Duration::from_secs(120), DelayedProvider::echo(Duration::from_millis(200))),
            resolved("medium", Duration::from_secs(120), DelayedProvider::echo(Duration::from_millis(400))),
            resolved("slow", Duration::from_secs(120), DelayedProvider::echo(Duration::from_millis(800))),
            resolved("impatient", Duration::from_secs(2), DelayedProvider::echo(Duration::from_secs(10))),
            resolved("stuck", Duration::from_secs(120), HangingProvider),
        ];

        let job = Job::new(b"photo".to_vec()).with_deadline(Duration::from_secs(5));
        let report = ShotgunDispatcher::new().run(job, &providers).await.unwrap();

        let statuses: Vec<(&str, OutcomeStatus)> = report
            .results()
            .iter()
            .map(|o| (o.provider_id(), o.status()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("fast", OutcomeStatus::Success),
                ("medium", OutcomeStatus::Success),
                ("slow", OutcomeStatus::Success),
                ("impatient", OutcomeStatus::Timeout),
                ("stuck", OutcomeStatus::Cancelled),
            ]
        );

        assert_eq!(report.success_count(), 3);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.success_count() + report.failure_count(), providers.len());
        assert!(report.total_elapsed() >= Duration::from_secs(5));
        assert!(report.total_elapsed() < Duration::from_millis(5500));

        let impatient = report.outcome("impatient").unwrap();
        assert!(impatient.elapsed() >= Duration::from_secs(2));
        assert!(impatient.elapsed() < Duration::from_secs(3));
    }

    /// Remote API that "removes" the background by returning a fixed cutout.
    struct CutoutApi {
        cutout: Vec<u8>,
    }

    #[async_trait]
    impl RemoteBackend for CutoutApi {
        async fn remove_background(&self, _model_id: &str, _image: Arc<[u8]>) -> Result<Vec<u8>, ProviderError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(self.cutout.clone())
        }
    }

    struct CutoutSession(Vec<u8>);

    impl InferenceSession for CutoutSession {
        fn run(&self, _input: &[u8]) -> Result<Vec<u8>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct CutoutLoader;

    impl ModelLoader for CutoutLoader {
        fn load(&self, model_id: &str) -> Result<Arc<dyn InferenceSession>, ProviderError> {
            match model_id {
                "isnet-general-use" => Ok(Arc::new(CutoutSession(png(3, 2, Rgba([0, 200, 0, 128]))))),
                other => Err(ProviderError::Unavailable(format!("model {} is not downloaded", other))),
            }
        }
    }

    const CONFIG: &str = r#"
shotgun:
  default_providers: [runware_rmbg2, kie_recraft, local_isnet, local_birefnet]
  batch_slack_secs: 30
upscale:
  default_scale: 4
providers:
  - id: runware_rmbg2
    name: RMBG 2.0
    category: remote_paid
    credential: RUNWARE_API_KEY
    cost: 0.0006
    priority: 1
    backend: { type: remote, client: runware, model_id: "runware:110@1" }
  - id: kie_recraft
    category: remote_metered
    credential: KIE_API_KEY
    cost: 0.005
    priority: 2
    backend: { type: remote, client: kie, model_id: recraft/remove-background }
  - id: local_isnet
    category: local_free
    priority: 5
    backend: { type: local_inference, model_id: isnet-general-use }
  - id: local_birefnet
    category: local_free
    priority: 4
    backend: { type: local_inference, model_id: birefnet-general }
"#;

    #[tokio::test]
    async fn test_config_to_selection_round_trip() {
        let config: Config = serde_yaml::from_str(CONFIG).unwrap();
        crate::config::validate_config(&config).unwrap();

        let cutout = png(4, 4, Rgba([255, 0, 0, 0]));
        let backends = Backends::default()
            .with_remote("runware", Arc::new(CutoutApi { cutout: cutout.clone() }))
            .with_remote("kie", Arc::new(CutoutApi { cutout }))
            .with_model_loader(Arc::new(CutoutLoader));
        let factory = ProviderFactory::new(&config, backends);
        // Only the runware key is present, so kie_recraft is registered but not dispatched.
        let credentials = Credentials::new().with("RUNWARE_API_KEY", "secret");
        let registry = Arc::new(factory.build_registry(&config, &credentials));

        let composer = PipelineComposer::from_config(&config, Arc::clone(&registry), factory.transform_pool().clone());
        let result = composer
            .run_pipeline(Job::new(b"original".to_vec()), &[], true, Some(2))
            .await
            .unwrap();

        let stage1 = result.stage1().unwrap();
        assert_eq!(stage1.results().len(), 3);
        assert_eq!(stage1.success_count(), 2);
        assert_eq!(
            stage1.outcome("local_birefnet").map(|o| o.status()),
            Some(OutcomeStatus::Failed)
        );
        assert!(stage1.outcome("kie_recraft").is_none());
        assert!((stage1.total_cost() - 0.0006).abs() < 1e-12);

        // One upscale round per success, each with exactly one outcome.
        assert_eq!(result.stage2().len(), stage1.success_count());
        for round in result.stage2().values() {
            assert_eq!(round.results().len(), 1);
            assert_eq!(round.results()[0].status(), OutcomeStatus::Success);
        }
        let upscaled = result.upscaled("local_isnet").unwrap();
        let image = image::load_from_memory(upscaled.payload().unwrap()).unwrap();
        assert_eq!(image.dimensions(), (6, 4));
        assert_eq!(upscaled.metadata()["scale_factor"], 2);
        assert_eq!(upscaled.metadata()["has_alpha"], true);

        let selector = ResultSelector::from_registry(&registry);
        let ranked: Vec<&str> = selector.present(stage1).iter().map(|o| o.provider_id()).collect();
        assert_eq!(ranked, vec!["runware_rmbg2", "local_isnet"]);

        let selection = selector.record(stage1, "local_isnet", None).unwrap();
        assert_eq!(selector.selection(stage1.job_id()), Some(selection));

        let json = serde_json::to_value(result.summary()).unwrap();
        assert_eq!(json["background_removal"]["successful"], 2);
        assert_eq!(json["upscale"]["rounds"], 2);
    }
}
