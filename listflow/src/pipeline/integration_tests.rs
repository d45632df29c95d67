//! End-to-end tests for page handling and the on-demand operations.

#[cfg(test)]
mod tests {
    use crate::config::PipelineConfig;
    use crate::errors::{ListflowError, RelayError};
    use crate::extract::FragmentKey;
    use crate::market::{LaunchChannel, SearchOptions};
    use crate::page::PageType;
    use crate::pipeline::{ListingPipeline, PageReport, PipelineBuilder, RegistrationOutcome};
    use crate::present::NoticeLevel;
    use crate::relay::{MockMessagingTransport, RelayMessage, RelayResponse};
    use crate::testing::{
        fixtures, InMemoryDocument, PresenterEvent, RecordingOpener, RecordingPresenter,
        ScriptedTransport, StaticComplianceGate,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    const SPARSE_SEARCH_PAGE: &str = r#"<html><body>
        <div data-testid="search-items">
          <li data-testid="item-cell">
            <a href="/item/m20000000001"><img src="https://static.mercdn.net/a.jpg">
              <span data-testid="thumbnail-item-price">¥500</span></a>
          </li>
          <li data-testid="item-cell">
            <a href="/item/m20000000002"><img src="https://static.mercdn.net/b.jpg">
              <span data-testid="thumbnail-item-name">Minolta X-700 body</span>
              <span data-testid="thumbnail-item-price">¥7,800</span></a>
          </li>
        </div>
    </body></html>"#;

    const LINKLESS_CARDS: &str = r#"<html><body>
        <div class="merItemList">
          <div><img src="placeholder.gif"><h3>Lens hood for 50mm</h3><span>¥800</span></div>
          <div><img src="placeholder.gif"><h3>Lens hood for 50mm</h3><span>¥800</span></div>
        </div>
    </body></html>"#;

    const LINKLESS_CARDS_LOADED: &str = r#"<html><body>
        <div class="merItemList">
          <div><img src="https://static.mercdn.net/a.jpg"><h3>Lens hood for 50mm</h3><span>¥800</span></div>
          <div><img src="https://static.mercdn.net/b.jpg"><h3>Lens hood for 50mm</h3><span>¥800</span></div>
        </div>
    </body></html>"#;

    fn search_host() -> InMemoryDocument {
        InMemoryDocument::new(fixtures::SEARCH_LOCATOR, fixtures::SEARCH_PAGE)
    }

    fn listing_host() -> InMemoryDocument {
        InMemoryDocument::new(fixtures::LISTING_LOCATOR, fixtures::LISTING_PAGE)
    }

    fn builder(presenter: &Arc<RecordingPresenter>) -> PipelineBuilder {
        ListingPipeline::builder(PipelineConfig::default()).presenter(presenter.clone())
    }

    fn gated(presenter: &Arc<RecordingPresenter>) -> ListingPipeline {
        builder(presenter)
            .compliance(Arc::new(
                StaticComplianceGate::new().with_blocked_terms(["ジャンク"]),
            ))
            .build()
    }

    #[tokio::test]
    async fn test_initialize_search_page() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = gated(&presenter);

        let PageReport::Search(report) = pipeline.initialize(&search_host()).await else {
            panic!("search locator should produce a batch report");
        };

        assert_eq!(report.scanned, 3);
        assert_eq!(report.processed, 3);
        assert_eq!(report.suppressed, 1);
        assert_eq!(
            report
                .fragments
                .iter()
                .map(|f| f.key.as_str().to_string())
                .collect::<Vec<_>>(),
            vec!["item:m10000000001", "item:m10000000002", "item:m10000000003"]
        );

        let blocked = &report.fragments[2];
        assert!(blocked.suppressed);
        assert_eq!(
            blocked.record.url,
            "https://jp.mercari.com/item/m10000000003"
        );
        assert!(blocked.verdict.as_ref().is_some_and(|v| v.is_blocked_term));

        assert_eq!(
            pipeline.current_page().map(|p| p.page_type()),
            Some(PageType::SearchListing)
        );
        let events = presenter.events();
        assert_eq!(events.first(), Some(&PresenterEvent::ControlPanel(true)));
        assert_eq!(
            presenter.notices(),
            vec![
                ("Processed 3 listings (1 hidden)".to_string(), NoticeLevel::Info),
                ("Listing tools initialized".to_string(), NoticeLevel::Info),
            ]
        );
    }

    #[tokio::test]
    async fn test_without_filter_nothing_is_suppressed() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter).build();

        let PageReport::Search(report) = pipeline.initialize(&search_host()).await else {
            panic!("expected a search report");
        };

        assert_eq!(report.processed, 3);
        assert_eq!(report.suppressed, 0);
        assert!(report.fragments.iter().all(|f| f.verdict.is_none()));
        assert!(presenter.decorated().iter().all(|(_, suppressed)| !suppressed));
    }

    #[tokio::test]
    async fn test_failed_filter_still_extracts() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter)
            .compliance(Arc::new(
                StaticComplianceGate::new()
                    .with_blocked_terms(["ジャンク"])
                    .failing(),
            ))
            .build();

        let PageReport::Search(report) = pipeline.initialize(&search_host()).await else {
            panic!("expected a search report");
        };

        assert_eq!(report.processed, 3);
        assert_eq!(report.suppressed, 0);
        assert!(!pipeline.compliance().is_ready());
    }

    #[tokio::test]
    async fn test_unextractable_fragment_is_marked_once() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter).build();
        let host = InMemoryDocument::new(fixtures::SEARCH_LOCATOR, SPARSE_SEARCH_PAGE);

        let PageReport::Search(first) = pipeline.initialize(&host).await else {
            panic!("expected a search report");
        };
        assert_eq!(first.unextractable, 1);
        assert_eq!(first.processed, 1);
        assert_eq!(pipeline.marks().len(), 2);

        let PageReport::Search(second) = pipeline.reprocess(&host).await else {
            panic!("expected a search report");
        };
        assert_eq!(second.unextractable, 0);
        assert_eq!(second.already_processed, 2);
        assert_eq!(presenter.decorated().len(), 1);
    }

    #[tokio::test]
    async fn test_reprocessing_is_idempotent() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = gated(&presenter);
        let host = search_host();

        pipeline.initialize(&host).await;
        let PageReport::Search(report) = pipeline.reprocess(&host).await else {
            panic!("expected a search report");
        };

        assert_eq!(report.processed, 0);
        assert_eq!(report.already_processed, 3);
        assert_eq!(presenter.decorated().len(), 3);

        let direct = pipeline.process_fragments(fixtures::SEARCH_PAGE, fixtures::SEARCH_LOCATOR);
        assert_eq!(direct.processed, 0);
        assert_eq!(presenter.decorated().len(), 3);
    }

    #[tokio::test]
    async fn test_navigation_resets_marks() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = gated(&presenter);
        let host = search_host();

        pipeline.initialize(&host).await;
        host.navigate(
            "https://jp.mercari.com/search?keyword=film%20camera&page_token=v1%3A1",
            fixtures::SEARCH_PAGE,
        );
        let PageReport::Search(report) = pipeline.initialize(&host).await else {
            panic!("expected a search report");
        };

        assert_eq!(report.processed, 3);
        assert_eq!(presenter.decorated().len(), 6);
    }

    #[tokio::test]
    async fn test_single_listing_page() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = gated(&presenter);

        let PageReport::Listing(outcome) = pipeline.initialize(&listing_host()).await else {
            panic!("item locator should produce a listing outcome");
        };

        assert_eq!(outcome.record.title, "Olympus OM-1 35mm film camera");
        assert_eq!(outcome.record.price_value, Some(18_500.0));
        assert!(!outcome.blocked_term_warning);
        assert!(!outcome.blocked_seller_warning);
        assert!(presenter.events().contains(&PresenterEvent::ListingControls(
            "Olympus OM-1 35mm film camera".to_string()
        )));
        assert!(!presenter
            .events()
            .iter()
            .any(|e| matches!(e, PresenterEvent::ControlPanel(_))));
    }

    #[tokio::test]
    async fn test_single_listing_warnings_replace_controls() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter)
            .compliance(Arc::new(
                StaticComplianceGate::new()
                    .with_blocked_terms(["om-1"])
                    .with_blocked_sellers(["424242"]),
            ))
            .build();

        let PageReport::Listing(outcome) = pipeline.initialize(&listing_host()).await else {
            panic!("expected a listing outcome");
        };

        assert!(outcome.blocked_term_warning);
        assert!(outcome.blocked_seller_warning);
        let events = presenter.events();
        assert!(events.contains(&PresenterEvent::BlockedTerms(
            ["om-1".to_string()].into_iter().collect()
        )));
        assert!(events.contains(&PresenterEvent::BlockedSeller(Some(
            "camera_shop".to_string()
        ))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, PresenterEvent::ListingControls(_))));
    }

    #[tokio::test]
    async fn test_target_item_page_reports_prices() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter).build();
        let host = InMemoryDocument::new(fixtures::TARGET_ITEM_LOCATOR, fixtures::TARGET_ITEM_PAGE);

        let PageReport::TargetItem(price) = pipeline.initialize(&host).await else {
            panic!("product locator should produce target prices");
        };

        assert_eq!(price.current, Some(24_800.0));
        assert_eq!(price.original, Some(31_000.0));
        assert_eq!(price.discount_percent, Some(20));
    }

    #[tokio::test]
    async fn test_unknown_page_idles() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter).build();
        let host = InMemoryDocument::new("https://example.com/", "<html></html>");

        let report = pipeline.initialize(&host).await;

        assert_eq!(
            report,
            PageReport::Idle {
                page_type: PageType::Unknown
            }
        );
        assert_eq!(
            presenter.notices(),
            vec![("Listing tools initialized".to_string(), NoticeLevel::Info)]
        );
    }

    #[tokio::test]
    async fn test_unreachable_relay_degrades_gracefully() {
        let mut relay = MockMessagingTransport::new();
        relay
            .expect_send()
            .withf(|m| matches!(m, RelayMessage::CheckConnection { .. }))
            .times(1)
            .returning(|_| Err(RelayError::Unavailable("no receiver".to_string())));

        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter).relay(Arc::new(relay)).build();

        let report = pipeline.initialize(&search_host()).await;
        assert!(matches!(report, PageReport::Search(ref r) if r.processed == 3));
    }

    #[tokio::test]
    async fn test_evaluate_shows_result() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter).build();
        let record = crate::listing::ListingRecord::new()
            .with_title("Nikon F3")
            .with_price("¥1,000");

        let result = pipeline.evaluate(&record, Some(5_000.0));

        assert_eq!(result.revenue, 5_000.0);
        assert_eq!(
            presenter.events().last(),
            Some(&PresenterEvent::Profitability(result))
        );
    }

    #[tokio::test]
    async fn test_toggle_suppression() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = gated(&presenter);
        pipeline.initialize(&search_host()).await;

        assert_eq!(pipeline.toggle_suppression(), Some(false));
        assert_eq!(
            presenter.events().last(),
            Some(&PresenterEvent::ControlPanel(false))
        );

        let unfiltered = builder(&presenter).build();
        assert_eq!(unfiltered.toggle_suppression(), None);
    }

    #[tokio::test]
    async fn test_search_target_market_opens_directly() {
        let presenter = Arc::new(RecordingPresenter::new());
        let opener = Arc::new(RecordingOpener::default());
        let pipeline = builder(&presenter)
            .compliance(Arc::new(
                StaticComplianceGate::new().with_blocked_terms(["ジャンク"]),
            ))
            .opener(opener.clone())
            .build();
        pipeline.initialize(&search_host()).await;

        let launch = pipeline
            .search_target_market("ジャンク Pentax MX body", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(launch.term, "Pentax MX body");
        assert_eq!(launch.channel, LaunchChannel::Direct);
        assert_eq!(opener.opened(), vec![launch.url.clone()]);
        assert_eq!(pipeline.recent_searches(), vec!["Pentax MX body"]);
    }

    #[tokio::test]
    async fn test_search_target_market_over_relay() {
        let mut relay = MockMessagingTransport::new();
        relay
            .expect_send()
            .returning(|_| Ok(Some(RelayResponse::ok(None))));

        let presenter = Arc::new(RecordingPresenter::new());
        let opener = Arc::new(RecordingOpener::default());
        let pipeline = builder(&presenter)
            .relay(Arc::new(relay))
            .opener(opener.clone())
            .build();

        let launch = pipeline
            .search_target_market("Nikon F3 film camera body", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(launch.channel, LaunchChannel::Relay);
        assert!(opener.opened().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_success() {
        let presenter = Arc::new(RecordingPresenter::new());
        let transport = Arc::new(ScriptedTransport::new().then_respond(201, r#"{"id": "inv-1"}"#));
        let pipeline = builder(&presenter).transport(transport.clone()).build();

        let PageReport::Listing(outcome) = pipeline.initialize(&listing_host()).await else {
            panic!("expected a listing outcome");
        };
        let registered = pipeline.register(&outcome.record).await.unwrap();

        let RegistrationOutcome::Submitted(receipt) = registered else {
            panic!("confirmed registration should be submitted");
        };
        assert!(receipt.success);
        assert_eq!(receipt.body["id"], "inv-1");

        let (_, payload) = transport.requests().remove(0);
        assert_eq!(payload.title, "Olympus OM-1 35mm film camera");
        assert_eq!(payload.source_url, fixtures::LISTING_LOCATOR);
        assert_eq!(payload.platform, "mercari");
        assert!(presenter.notices().contains(&(
            "Registered with the inventory service".to_string(),
            NoticeLevel::Success
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_cancelled() {
        let presenter = Arc::new(RecordingPresenter::declining());
        let transport = Arc::new(ScriptedTransport::new());
        let pipeline = builder(&presenter).transport(transport.clone()).build();
        let record = crate::listing::ListingRecord::new().with_title("Nikon F3");

        let outcome = pipeline.register(&record).await.unwrap();

        assert_eq!(outcome, RegistrationOutcome::Cancelled);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_failure_is_reported() {
        let presenter = Arc::new(RecordingPresenter::new());
        let transport = Arc::new(
            ScriptedTransport::new().then_respond(500, r#"{"message": "database down"}"#),
        );
        let pipeline = ListingPipeline::builder(
            PipelineConfig::default().with_retries(1, Duration::from_secs(1)),
        )
        .presenter(presenter.clone())
        .transport(transport.clone())
        .build();
        let record = crate::listing::ListingRecord::new().with_title("Nikon F3");

        let err = pipeline.register(&record).await.unwrap_err();

        assert!(matches!(err, ListflowError::Dispatch(ref e) if e.attempts == 2));
        assert_eq!(transport.call_count(), 2);
        assert!(presenter.notices().contains(&(
            "Registration failed: database down".to_string(),
            NoticeLevel::Error
        )));
    }

    #[tokio::test]
    async fn test_register_without_dispatcher() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = builder(&presenter).build();
        let record = crate::listing::ListingRecord::new().with_title("Nikon F3");

        let err = pipeline.register(&record).await.unwrap_err();
        assert!(matches!(err, ListflowError::NotConfigured(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_arms_watcher_on_search_pages() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = Arc::new(gated(&presenter));

        let (report, watcher) = pipeline.start(Arc::new(search_host())).await;
        assert!(matches!(report, PageReport::Search(_)));
        assert!(watcher.is_some());

        let (report, watcher) = pipeline.start(Arc::new(listing_host())).await;
        assert!(matches!(report, PageReport::Listing(_)));
        assert!(watcher.is_none());
    }

    #[tokio::test]
    async fn test_identical_linkless_cards_are_both_processed() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = gated(&presenter);
        let host = InMemoryDocument::new(fixtures::SEARCH_LOCATOR, LINKLESS_CARDS);

        let PageReport::Search(report) = pipeline.initialize(&host).await else {
            panic!("search locator should produce a batch report");
        };

        assert_eq!(report.processed, 2);
        assert_eq!(report.already_processed, 0);
        assert_eq!(presenter.decorated().len(), 2);
        assert_ne!(report.fragments[0].key, report.fragments[1].key);
    }

    #[tokio::test]
    async fn test_card_markup_change_does_not_redecorate() {
        let presenter = Arc::new(RecordingPresenter::new());
        let pipeline = gated(&presenter);
        let host = InMemoryDocument::new(fixtures::SEARCH_LOCATOR, LINKLESS_CARDS);
        pipeline.initialize(&host).await;

        host.set_html(LINKLESS_CARDS_LOADED);
        let PageReport::Search(report) = pipeline.reprocess(&host).await else {
            panic!("search locator should produce a batch report");
        };

        assert_eq!(report.processed, 0);
        assert_eq!(report.already_processed, 2);
        assert_eq!(presenter.decorated().len(), 2);
    }

    #[tokio::test]
    async fn test_panicking_fragment_is_isolated_and_retried() {
        let failing_key = FragmentKey::for_item("m10000000002");
        let presenter = Arc::new(RecordingPresenter::panicking_once_on(failing_key.clone()));
        let pipeline = gated(&presenter);
        let host = search_host();

        let PageReport::Search(first) = pipeline.initialize(&host).await else {
            panic!("search locator should produce a batch report");
        };
        assert_eq!(first.failed, 1);
        assert_eq!(first.processed, 2);
        assert_eq!(presenter.decorated().len(), 2);

        let PageReport::Search(second) = pipeline.reprocess(&host).await else {
            panic!("search locator should produce a batch report");
        };
        assert_eq!(second.failed, 0);
        assert_eq!(second.processed, 1);
        assert_eq!(second.already_processed, 2);
        assert_eq!(second.fragments[0].key, failing_key);
        assert_eq!(presenter.decorated().len(), 3);
    }
}
