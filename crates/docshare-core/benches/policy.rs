use criterion::{black_box, criterion_group, criterion_main, Criterion};

use docshare_core::{
    can_access, AccessState, ContentHash, DocumentId, DocumentMeta, GrantId, GrantPermissions,
    Operation, PermissionGrant, UserId,
};

fn document() -> DocumentMeta {
    DocumentMeta {
        id: DocumentId(1),
        owner_id: UserId::new("owner"),
        file_name: "contract.pdf".into(),
        content_type: "application/pdf".into(),
        size_bytes: 2048,
        content_hash: ContentHash([0u8; 32]),
        description: String::new(),
        category: "Uncategorized".into(),
        uploaded_at: 0,
    }
}

fn bench_can_access(c: &mut Criterion) {
    let doc = document();
    let grants: Vec<PermissionGrant> = (0..1_000)
        .map(|i| PermissionGrant {
            id: GrantId(i),
            document_id: doc.id,
            grantee_id: UserId::new(format!("user-{i}")),
            permissions: GrantPermissions {
                can_sign: i % 2 == 0,
                can_verify: false,
            },
            granted_at: 0,
        })
        .collect();
    let state = AccessState::from_grants(doc.id, &grants);
    let grantee = UserId::new("user-500");
    let stranger = UserId::new("stranger");

    c.bench_function("can_access/grantee_download", |b| {
        b.iter(|| can_access(black_box(&grantee), &doc, &state, Operation::Download))
    });
    c.bench_function("can_access/grantee_sign", |b| {
        b.iter(|| can_access(black_box(&grantee), &doc, &state, Operation::Sign))
    });
    c.bench_function("can_access/stranger_view", |b| {
        b.iter(|| can_access(black_box(&stranger), &doc, &state, Operation::View))
    });
    c.bench_function("access_state/from_grants_1000", |b| {
        b.iter(|| AccessState::from_grants(doc.id, black_box(&grants)))
    });
}

criterion_group!(benches, bench_can_access);
criterion_main!(benches);
