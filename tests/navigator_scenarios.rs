use std::collections::HashSet;

use bookmark_sampler::domain::model::{FolderChain, FolderEntry, NavState, SampleSize};
use bookmark_sampler::domain::traits::StateChannel;
use bookmark_sampler::infrastructure::bookmark_tree::BookmarkTree;
use bookmark_sampler::infrastructure::rng::RandSource;
use bookmark_sampler::infrastructure::serde_json_adapter::parse_bookmarks;
use bookmark_sampler::infrastructure::state_channel::spawn_state_keeper;
use bookmark_sampler::infrastructure::state_file::StateFile;
use bookmark_sampler::usecase::navigator::Navigator;
use tempfile::tempdir;

fn small_tree() -> BookmarkTree {
    let dto = parse_bookmarks(
        r#"{
  "roots": {
    "bookmark_bar": {
      "type": "folder", "id": "1", "name": "Work",
      "children": [ { "type": "url", "id": "4", "name": "c", "url": "http://c" } ]
    }
  }
}"#,
    )
    .expect("fixture");
    let mut tree = BookmarkTree::from_dto(&dto);
    tree.create("0", "a", Some("http://a")).expect("a");
    tree.create("0", "b", Some("http://b")).expect("b");
    tree
}

fn nested_tree() -> BookmarkTree {
    let dto = parse_bookmarks(
        r#"{
  "roots": {
    "bookmark_bar": {
      "type": "folder", "id": "1", "name": "Bookmarks bar",
      "children": [
        { "type": "folder", "id": "10", "name": "Work", "children": [
          { "type": "folder", "id": "20", "name": "Deep", "children": [] },
          { "type": "url", "id": "11", "name": "w", "url": "http://w" }
        ] },
        { "type": "url", "id": "2", "name": "a", "url": "http://a" },
        { "type": "url", "id": "3", "name": "b", "url": "http://b" },
        { "type": "url", "id": "4", "name": "c", "url": "http://c" },
        { "type": "url", "id": "5", "name": "d", "url": "http://d" },
        { "type": "url", "id": "6", "name": "e", "url": "http://e" }
      ]
    },
    "other": { "type": "folder", "id": "30", "name": "Other bookmarks", "children": [] }
  },
  "version": 1
}"#,
    )
    .expect("fixture");
    BookmarkTree::from_dto(&dto)
}

fn chain_ids(nav: &Navigator<BookmarkTree, StateFile>) -> Vec<String> {
    nav.chain().entries().iter().map(|e| e.id.clone()).collect()
}

#[tokio::test]
async fn root_listing_partitions_folders_and_urls() {
    let dir = tempdir().expect("tempdir");
    let nav = Navigator::restore(small_tree(), StateFile::new(dir.path().join("s.json")), None)
        .await
        .expect("restore");

    assert_eq!(nav.urls(), ["http://a", "http://b"]);
    let titles: Vec<&str> = nav.folders().iter().map(|f| f.title.as_str()).collect();
    assert_eq!(titles, ["Work"]);
    assert_eq!(nav.breadcrumb().to_string(), "root");
}

#[tokio::test]
async fn descending_updates_breadcrumb_and_urls() {
    let dir = tempdir().expect("tempdir");
    let mut nav = Navigator::restore(small_tree(), StateFile::new(dir.path().join("s.json")), None)
        .await
        .expect("restore");

    nav.descend("1", "Work").await.expect("descend");

    assert_eq!(nav.breadcrumb().to_string(), "root → Work");
    assert_eq!(
        nav.breadcrumb().to_html(),
        "root &rarr; <strong>Work</strong>"
    );
    assert_eq!(nav.urls(), ["http://c"]);
}

#[tokio::test]
async fn descend_then_ascend_round_trips() {
    let dir = tempdir().expect("tempdir");
    let mut nav = Navigator::restore(nested_tree(), StateFile::new(dir.path().join("s.json")), None)
        .await
        .expect("restore");

    let before = nav.chain().clone();
    nav.descend("1", "Bookmarks bar").await.expect("bar");
    nav.descend("10", "Work").await.expect("work");
    nav.descend("20", "Deep").await.expect("deep");
    assert_eq!(chain_ids(&nav), ["1", "10", "20"]);

    nav.ascend().await.expect("up");
    assert_eq!(chain_ids(&nav), ["1", "10"]);
    nav.ascend().await.expect("up");
    nav.ascend().await.expect("up");
    assert_eq!(nav.chain(), &before);
}

#[tokio::test]
async fn sample_of_three_from_five_is_distinct_members() {
    let dir = tempdir().expect("tempdir");
    let mut nav = Navigator::restore(nested_tree(), StateFile::new(dir.path().join("s.json")), None)
        .await
        .expect("restore");
    nav.descend("1", "Bookmarks bar").await.expect("bar");
    nav.set_sample_size(SampleSize::new(3).expect("size")).await;
    assert_eq!(nav.urls().len(), 5);

    let pool: HashSet<String> = nav.urls().iter().cloned().collect();
    for seed in 0..20 {
        let picked = nav.sample(&mut RandSource::seeded(seed)).await;
        assert_eq!(picked.len(), 3);
        let distinct: HashSet<&String> = picked.iter().collect();
        assert_eq!(distinct.len(), 3);
        assert!(picked.iter().all(|u| pool.contains(u)));
    }
}

#[tokio::test]
async fn moving_a_chain_folder_resets_on_the_change_event() {
    let dir = tempdir().expect("tempdir");
    let mut tree = nested_tree();
    let mut events = tree.subscribe();
    let mut nav = Navigator::restore(tree, StateFile::new(dir.path().join("s.json")), None)
        .await
        .expect("restore");

    nav.descend("1", "Bookmarks bar").await.expect("bar");
    nav.descend("10", "Work").await.expect("work");
    nav.descend("20", "Deep").await.expect("deep");

    // Deep now lives under Other bookmarks; chain[-2] no longer matches.
    nav.store_mut().move_node("20", "30", None).expect("move");
    let event = events.recv().await.expect("moved event");
    nav.handle_store_event(event).await;

    assert!(nav.chain().is_empty());
    assert_eq!(nav.breadcrumb().to_string(), "root");
    assert_eq!(nav.folders().len(), 2);
}

#[tokio::test]
async fn removing_the_leaf_resets_to_root() {
    let dir = tempdir().expect("tempdir");
    let mut tree = nested_tree();
    let mut events = tree.subscribe();
    let mut nav = Navigator::restore(tree, StateFile::new(dir.path().join("s.json")), None)
        .await
        .expect("restore");
    nav.descend("1", "Bookmarks bar").await.expect("bar");
    nav.descend("10", "Work").await.expect("work");

    nav.store_mut().remove("10").expect("remove");
    nav.handle_store_event(events.recv().await.expect("removed event"))
        .await;

    assert!(nav.chain().is_empty());
}

#[tokio::test]
async fn unrelated_changes_keep_the_chain() {
    let dir = tempdir().expect("tempdir");
    let mut tree = nested_tree();
    let mut events = tree.subscribe();
    let mut nav = Navigator::restore(tree, StateFile::new(dir.path().join("s.json")), None)
        .await
        .expect("restore");
    nav.descend("1", "Bookmarks bar").await.expect("bar");
    nav.descend("10", "Work").await.expect("work");

    nav.store_mut()
        .create("10", "new", Some("http://new"))
        .expect("create");
    nav.handle_store_event(events.recv().await.expect("created event"))
        .await;

    assert_eq!(chain_ids(&nav), ["1", "10"]);
    assert_eq!(nav.urls(), ["http://w", "http://new"]);
}

#[tokio::test]
async fn state_file_carries_the_chain_between_navigators() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("s.json");

    let mut first = Navigator::restore(nested_tree(), StateFile::new(&path), None)
        .await
        .expect("restore");
    first.descend("1", "Bookmarks bar").await.expect("bar");
    first
        .set_sample_size(SampleSize::new(7).expect("size"))
        .await;
    drop(first);

    let second = Navigator::restore(nested_tree(), StateFile::new(&path), None)
        .await
        .expect("restore");
    assert_eq!(chain_ids(&second), ["1"]);
    assert_eq!(second.sample_size().get(), 7);
}

#[tokio::test]
async fn reopened_sessions_share_the_keeper_state() {
    let seeded = NavState {
        folder_chain: FolderChain::from(vec![
            FolderEntry::new("1", "Bookmarks bar"),
            FolderEntry::new("10", "Work"),
        ]),
        sample_size: SampleSize::new(2).expect("size"),
    };
    let (client, keeper) = spawn_state_keeper(seeded, None);

    let mut popup = Navigator::restore(nested_tree(), client.clone(), None)
        .await
        .expect("restore");
    assert_eq!(popup.breadcrumb().to_string(), "root → Bookmarks bar → Work");
    popup.ascend().await.expect("up");
    drop(popup);

    let mut probe = client.clone();
    let held = probe.load().await.expect("load");
    assert_eq!(held.folder_chain.len(), 1);
    assert_eq!(held.sample_size.get(), 2);

    let reopened = Navigator::restore(nested_tree(), client, None)
        .await
        .expect("restore");
    assert_eq!(reopened.breadcrumb().to_string(), "root → Bookmarks bar");

    drop(reopened);
    drop(probe);
    keeper.await.expect("keeper");
}

#[tokio::test]
async fn a_stale_keeper_chain_is_dropped_on_open() {
    let stale = NavState {
        folder_chain: FolderChain::from(vec![
            FolderEntry::new("30", "Other bookmarks"),
            FolderEntry::new("10", "Work"),
        ]),
        sample_size: SampleSize::default(),
    };
    let (client, keeper) = spawn_state_keeper(stale, None);

    let nav = Navigator::restore(nested_tree(), client.clone(), None)
        .await
        .expect("restore");
    assert!(nav.chain().is_empty());
    drop(nav);

    let mut probe = client;
    assert!(probe.load().await.expect("load").folder_chain.is_empty());
    drop(probe);
    keeper.await.expect("keeper");
}
