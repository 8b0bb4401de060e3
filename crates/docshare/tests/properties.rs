//! Property tests: random sharing scripts replayed against the service and
//! a plain model of who owns and who was granted what.

use std::collections::BTreeMap;

use bytes::Bytes;
use docshare::core::{decide, Relation};
use docshare::{
    DocumentId, ErrorKind, GrantPermissions, Operation, ServiceError, VerificationRequest,
};
use docshare_testkit::generators::{
    actions, grant_permissions, operation, upload, user_index, Action,
};
use docshare_testkit::{sample_pdf, TestFixture};
use proptest::prelude::*;

#[derive(Debug)]
struct ModelDoc {
    id: DocumentId,
    owner: usize,
    deleted: bool,
}

#[derive(Debug, Default)]
struct Model {
    docs: Vec<ModelDoc>,
    grants: BTreeMap<(DocumentId, usize), GrantPermissions>,
}

impl Model {
    /// What a mutating call by `actor` on `doc` must fail with, if anything.
    fn owner_gate(&self, doc: &ModelDoc, actor: usize) -> Option<ErrorKind> {
        if doc.deleted {
            Some(ErrorKind::NotFound)
        } else if doc.owner != actor {
            Some(ErrorKind::Forbidden)
        } else {
            None
        }
    }

    fn can_read(&self, doc: &ModelDoc, user: usize) -> bool {
        doc.owner == user || self.grants.contains_key(&(doc.id, user))
    }
}

fn outcome<T>(result: &Result<T, ServiceError>) -> Option<ErrorKind> {
    result.as_ref().err().map(ServiceError::kind)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn service_matches_model(script in actions(24)) {
        runtime().block_on(async {
            let fx = TestFixture::memory().await;
            let svc = &fx.service;
            let sessions = fx.sessions();
            let mut model = Model::default();

            for action in &script {
                match *action {
                    Action::Upload { owner } => {
                        let dto = svc.create_document(sessions[owner], sample_pdf(32)).await.unwrap();
                        model.docs.push(ModelDoc { id: dto.id, owner, deleted: false });
                    }
                    Action::Share { doc, actor, target, permissions } => {
                        if model.docs.is_empty() {
                            continue;
                        }
                        let d = &model.docs[doc % model.docs.len()];
                        let expected = model.owner_gate(d, actor).or_else(|| {
                            if target == d.owner {
                                Some(ErrorKind::InvalidInput)
                            } else if model.grants.contains_key(&(d.id, target)) {
                                Some(ErrorKind::Conflict)
                            } else {
                                None
                            }
                        });

                        let result = svc
                            .share_with(sessions[actor], d.id, sessions[target].user_id(), permissions)
                            .await;
                        assert_eq!(outcome(&result), expected, "{:?}", action);
                        if result.is_ok() {
                            model.grants.insert((d.id, target), permissions);
                        }
                    }
                    Action::Revoke { doc, actor, target } => {
                        if model.docs.is_empty() {
                            continue;
                        }
                        let d = &model.docs[doc % model.docs.len()];
                        let expected = model.owner_gate(d, actor);

                        let result = svc.revoke(sessions[actor], d.id, sessions[target].user_id()).await;
                        assert_eq!(outcome(&result), expected, "{:?}", action);
                        if let Ok(removed) = result {
                            assert_eq!(removed, model.grants.remove(&(d.id, target)).is_some());
                        }
                    }
                    Action::Delete { doc, actor } => {
                        if model.docs.is_empty() {
                            continue;
                        }
                        let idx = doc % model.docs.len();
                        let expected = model.owner_gate(&model.docs[idx], actor);

                        let id = model.docs[idx].id;
                        let result = svc.delete_document(sessions[actor], id).await;
                        assert_eq!(outcome(&result), expected, "{:?}", action);
                        if result.is_ok() {
                            model.docs[idx].deleted = true;
                            model.grants.retain(|(doc_id, _), _| *doc_id != id);
                        }
                    }
                }
            }

            for (user, session) in sessions.iter().enumerate() {
                for d in &model.docs {
                    let expected = if d.deleted {
                        Some(ErrorKind::NotFound)
                    } else if model.can_read(d, user) {
                        None
                    } else {
                        Some(ErrorKind::Forbidden)
                    };
                    let result = svc.download_document(session, d.id).await;
                    assert_eq!(outcome(&result), expected);

                    if let Ok(grants) = svc.list_grants(sessions[d.owner], d.id).await {
                        let flags: Vec<_> = grants.iter().map(|g| g.permissions).collect();
                        let modelled: Vec<_> = model
                            .grants
                            .iter()
                            .filter(|((doc_id, _), _)| *doc_id == d.id)
                            .map(|(_, p)| *p)
                            .collect();
                        assert_eq!(flags.len(), modelled.len());
                        assert!(flags.iter().all(|f| modelled.contains(f)));
                    }
                }

                let mut expected: Vec<DocumentId> = model
                    .docs
                    .iter()
                    .filter(|d| !d.deleted && model.can_read(d, user))
                    .map(|d| d.id)
                    .collect();
                expected.sort_by(|a, b| b.cmp(a));

                let listed: Vec<DocumentId> = svc
                    .list_documents_visible_to(session)
                    .await
                    .unwrap()
                    .iter()
                    .map(|d| d.id)
                    .collect();
                assert_eq!(listed, expected);
            }
        });
    }

    #[test]
    fn service_agrees_with_evaluator(
        op in operation(),
        actor in user_index(),
        rights in grant_permissions(),
    ) {
        runtime().block_on(async {
            let fx = TestFixture::memory().await;
            let svc = &fx.service;
            let sessions = fx.sessions();

            // alice owns, bob holds `rights`, carol is a stranger.
            let doc = svc.create_document(&fx.alice, sample_pdf(64)).await.unwrap();
            svc.share_with(&fx.alice, doc.id, fx.bob.user_id(), rights).await.unwrap();
            let relation = match actor {
                0 => Relation::Owner,
                1 => Relation::Grantee(rights),
                _ => Relation::Stranger,
            };

            let session = sessions[actor];
            let result = match op {
                Operation::View => outcome(&svc.document_metadata(session, doc.id).await),
                Operation::Download => outcome(&svc.download_document(session, doc.id).await),
                Operation::Sign => outcome(
                    &svc.sign_document(session, doc.id, Bytes::from_static(b"mark")).await,
                ),
                Operation::Verify => outcome(
                    &svc.verify_document(session, doc.id, VerificationRequest::default()).await,
                ),
                Operation::Delete => outcome(&svc.delete_document(session, doc.id).await),
                Operation::Share => {
                    outcome(&svc.share(session, doc.id, fx.carol.user_id()).await)
                }
                Operation::Revoke => {
                    outcome(&svc.revoke(session, doc.id, fx.bob.user_id()).await)
                }
                Operation::ListGrants => outcome(&svc.list_grants(session, doc.id).await),
            };

            let expected = if decide(relation, op) { None } else { Some(ErrorKind::Forbidden) };
            assert_eq!(result, expected, "{:?} by {}", op, actor);
        });
    }

    #[test]
    fn uploads_accepted_iff_pdf(doc in upload()) {
        let accepted = !doc.content.is_empty()
            && doc.extension().as_deref() == Some(".pdf")
            && doc
                .content_type
                .split(';')
                .next()
                .map(|t| t.trim().eq_ignore_ascii_case("application/pdf"))
                .unwrap_or(false);

        runtime().block_on(async {
            let fx = TestFixture::memory().await;
            let result = fx.service.create_document(&fx.alice, doc).await;

            match outcome(&result) {
                None => assert!(accepted),
                Some(kind) => {
                    assert!(!accepted);
                    assert_eq!(kind, ErrorKind::InvalidInput);
                }
            }
        });
    }
}
