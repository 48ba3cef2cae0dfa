// Composite load suite: multi-key groups either land completely or are
// rolled back completely.

use res_cache::{
    AllocatorPair, AllocatorTag, CompositeLock, LoadDescriptor, LoadError, MaterialData,
    ResourceKey, ResourceManager, ResourcePayload, ResourceType, ShaderData, TextureData,
};

fn texture(allocs: &AllocatorPair) -> Result<ResourcePayload, LoadError> {
    Ok(ResourcePayload::Texture(TextureData {
        pixels: allocs.allocate(AllocatorTag::Main, 64),
        width: 4,
        height: 4,
    }))
}

fn shader(allocs: &AllocatorPair) -> Result<ResourcePayload, LoadError> {
    Ok(ResourcePayload::Shader(ShaderData {
        code: allocs.allocate(AllocatorTag::Main, 32),
    }))
}

fn failing(_allocs: &AllocatorPair) -> Result<ResourcePayload, LoadError> {
    Err(LoadError::Decode("corrupt texture header".into()))
}

// Test: a successful composite inserts every sub-resource plus the
// material entry that names them.
#[test]
fn successful_composite_lands_completely() {
    let mut m = ResourceManager::new();
    let lock = CompositeLock::new();
    let desc = LoadDescriptor::default();

    m.composite_load(&lock, |scope| {
        scope.load(b"lit.hlsl", ResourceType::Shader, &desc, shader)?;
        scope.load(b"wall_albedo.png", ResourceType::Texture, &desc, texture)?;
        scope.load(b"wall_normal.png", ResourceType::Texture, &desc, texture)?;
        scope.manager().add_resource(
            b"wall.mat",
            ResourceType::Material,
            ResourcePayload::Material(MaterialData {
                shader: ResourceKey::from_path(b"lit.hlsl"),
                textures: vec![
                    ResourceKey::from_path(b"wall_albedo.png"),
                    ResourceKey::from_path(b"wall_normal.png"),
                ],
            }),
            &desc,
            None,
            1,
        );
        Ok(())
    })
    .unwrap();

    assert!(m.exists(b"lit.hlsl", ResourceType::Shader, b""));
    assert!(m.exists(b"wall_albedo.png", ResourceType::Texture, b""));
    assert!(m.exists(b"wall_normal.png", ResourceType::Texture, b""));
    assert!(m.exists(b"wall.mat", ResourceType::Material, b""));
    m.unload_everything();
}

// Test: a failure partway rolls back the scope's sub-loads. Fresh
// entries disappear; a pre-existing entry that the scope incremented
// only loses the increment.
#[test]
fn failure_rolls_back_fresh_and_incremented_entries() {
    let mut m = ResourceManager::new();
    let lock = CompositeLock::new();
    let desc = LoadDescriptor::default();

    // Held by someone outside the composite.
    m.load(b"wall_albedo.png", ResourceType::Texture, &desc, texture)
        .unwrap();

    let err = m
        .composite_load(&lock, |scope| {
            scope.load(b"lit.hlsl", ResourceType::Shader, &desc, shader)?;
            // Cache hit: bumps the existing count to 2.
            scope.load(b"wall_albedo.png", ResourceType::Texture, &desc, texture)?;
            // Fails, so the scope never completes.
            scope.load(b"wall_normal.png", ResourceType::Texture, &desc, failing)?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, LoadError::Decode(_)));

    assert!(!m.exists(b"lit.hlsl", ResourceType::Shader, b""));
    assert!(!m.exists(b"wall_normal.png", ResourceType::Texture, b""));
    let entry = m.entry(b"wall_albedo.png", ResourceType::Texture, b"").unwrap();
    assert_eq!(entry.ref_count(), 1);

    // Only the outside holder's texture remains allocated.
    assert_eq!(m.allocators().live_blocks(), 1);
    m.unload_everything();
}

// Test: sub-loads marked skip_subresources are not recorded and survive
// a rollback.
#[test]
fn skipped_sub_loads_survive_rollback() {
    let mut m = ResourceManager::new();
    let lock = CompositeLock::new();

    let keep = LoadDescriptor {
        skip_subresources: true,
        ..Default::default()
    };
    let _ = m
        .composite_load(&lock, |scope| {
            scope.load(b"persistent.hlsl", ResourceType::Shader, &keep, shader)?;
            scope.load(
                b"broken.png",
                ResourceType::Texture,
                &LoadDescriptor::default(),
                failing,
            )?;
            Ok(())
        })
        .unwrap_err();

    assert!(m.exists(b"persistent.hlsl", ResourceType::Shader, b""));
    m.unload_everything();
}

// Test: the lock is reusable after a failed composite, and rollback uses
// the recorded increments, not ones.
#[test]
fn lock_survives_failure_and_rollback_honors_increments() {
    let mut m = ResourceManager::new();
    let lock = CompositeLock::new();
    let heavy = LoadDescriptor::default().increment(3);

    let _ = m
        .composite_load(&lock, |scope| {
            scope.load(b"lit.hlsl", ResourceType::Shader, &heavy, shader)?;
            scope.load(
                b"broken.png",
                ResourceType::Texture,
                &LoadDescriptor::default(),
                failing,
            )?;
            Ok(())
        })
        .unwrap_err();
    assert!(m.is_empty(), "rollback drops all three references at once");

    // Same lock, clean second attempt.
    m.composite_load(&lock, |scope| {
        scope.load(b"lit.hlsl", ResourceType::Shader, &heavy, shader)?;
        Ok(())
    })
    .unwrap();
    assert_eq!(
        m.entry(b"lit.hlsl", ResourceType::Shader, b"").unwrap().ref_count(),
        3
    );
    m.unload_everything();
}

// Test: in-place sub-loads participate in rollback like handler loads.
#[test]
fn in_place_sub_loads_roll_back() {
    let mut m = ResourceManager::new();
    let lock = CompositeLock::new();
    let desc = LoadDescriptor::default();

    let _ = m
        .composite_load(&lock, |scope| {
            scope.load_in_place(b"notes.txt", ResourceType::TextFile, 16, &desc, |region| {
                region[..5].copy_from_slice(b"hello");
                Ok(())
            })?;
            scope.load(b"broken.png", ResourceType::Texture, &desc, failing)?;
            Ok(())
        })
        .unwrap_err();

    assert!(!m.exists(b"notes.txt", ResourceType::TextFile, b""));
    assert_eq!(m.allocators().live_blocks(), 0);
}
