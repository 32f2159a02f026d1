// Integration tests for the data file, status palette and floor rendering

use anyhow::Result;
use roomplan::app::App;
use roomplan::models::{BuildingData, FloorRecord, RoomRecord, StatusColors};
use roomplan::report::Report;
use roomplan::scene::{Background, FileImageProbe, FloorScene, Point, Rgba, RoomId};
use roomplan::store::{Seed, Store};

fn sample_document() -> BuildingData {
    let mut data = BuildingData::default();
    data.statuses.insert("архив", StatusColors::new("#80123456", "#fafafa"));

    let mut leased = RoomRecord::new("101".into(), "1".into(), vec![[12.5, 40.0], [310.75, 40.0], [310.75, 222.125]]);
    leased.status = "занят".into();
    leased.renter_name = Some("ИП Сидоров".into());
    leased.inn = "500100732259".into();
    leased.payment_type = "Безналичные".into();
    leased.entry_date = "2024-02-01".into();
    leased.exit_date = "2025-01-31".into();

    let floor = data.floor_mut("1");
    floor.plan_path = Some("/plans/floor1.png".into());
    floor.rooms.push(leased);
    floor.rooms.push(RoomRecord::new("A-2".into(), "1".into(), vec![[0.0, 0.0], [1e-3, 0.0], [0.0, 1e6]]));
    data.floors.insert("0".into(), FloorRecord::default());
    data
}

#[test]
fn test_save_then_reload_is_identical() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("building_data.json");
    let data = sample_document();

    Store::with_data(&path, data.clone()).save()?;
    let reloaded = Store::load(&path)?;
    assert_eq!(reloaded.data(), &data);

    let names: Vec<&str> = reloaded.data().statuses.names().collect();
    assert_eq!(names, vec!["свободный", "занят", "скоро освободится", "в ремонте", "архив"]);

    let raw = std::fs::read_to_string(&path)?;
    assert!(raw.contains("ИП Сидоров"));
    assert!(raw.contains("\"#80123456\""));
    Ok(())
}

#[test]
fn test_save_leaves_no_temp_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("building_data.json");
    let mut store = Store::with_data(&path, sample_document());
    store.save()?;
    store.mutate(|data| data.floor_mut("3").rooms.clear())?;

    let entries: Vec<_> = std::fs::read_dir(dir.path())?.collect::<std::io::Result<_>>()?;
    assert_eq!(entries.len(), 1);
    Ok(())
}

#[test]
fn test_corrupt_file_loads_default_and_is_kept() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("building_data.json");
    std::fs::write(&path, "{ not json")?;

    let (store, seed) = Store::open(&path, &[]);
    assert_eq!(seed, Seed::Existing);
    assert_eq!(store.data(), &BuildingData::default());
    assert_eq!(std::fs::read_to_string(&path)?, "{ not json");
    assert!(Store::load(&path).is_err());
    Ok(())
}

#[test]
fn test_missing_file_is_seeded_from_template() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("template.json");
    Store::with_data(&template, sample_document()).save()?;

    let path = dir.path().join("home/building_data.json");
    let missing = dir.path().join("nowhere.json");
    let (store, seed) = Store::open(&path, &[missing, template.clone()]);
    assert_eq!(seed, Seed::Template(template));
    assert_eq!(store.data(), &sample_document());
    Ok(())
}

#[test]
fn test_floor_without_plan_gets_placeholder() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (store, seed) = Store::open(dir.path().join("building_data.json"), &[]);
    assert_eq!(seed, Seed::Empty);

    let app = App::new(store, Box::new(FileImageProbe));
    let background = &app.scene().background;
    assert_eq!(background.size(), (1000, 800));
    assert!(matches!(background, Background::Placeholder { color, .. } if *color == Rgba::LIGHT_GRAY));
    assert_eq!(app.scene().room_count(), 0);
    Ok(())
}

#[test]
fn test_plan_image_sets_scene_size() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let plan = dir.path().join("floor1.png");
    image::RgbImage::new(64, 48).save(&plan)?;

    let mut floor = FloorRecord::default();
    floor.plan_path = Some(plan.to_string_lossy().into_owned());
    floor.rooms.push(RoomRecord::new("1".into(), "1".into(), vec![]));
    let data = BuildingData::default();
    let scene = FloorScene::build("1", Some(&floor), &data.statuses, &FileImageProbe);

    assert_eq!(scene.background.size(), (64, 48));
    assert!(matches!(scene.background, Background::Image { .. }));
    // rooms without a polygon are not drawn
    assert_eq!(scene.room_count(), 0);
    Ok(())
}

#[test]
fn test_renamed_status_leaves_dangling_room() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("building_data.json");
    let mut data = sample_document();
    data.floor_mut("1").rooms[1].status = "архив".into();
    Store::with_data(&path, data).save()?;

    let mut app = App::new(Store::load(&path)?, Box::new(FileImageProbe));
    app.load_floor(1);
    let before = app.scene().room(RoomId(1)).map(|v| v.polygon.fill);
    assert_eq!(before, Rgba::parse("#80123456"));

    app.rename_status("архив", "хранение", StatusColors::new("#B3000000", "#ffffff"))?;

    assert_eq!(app.data().floors["1"].rooms[1].status, "архив");
    assert!(app.data().statuses.contains("хранение"));
    assert!(!app.data().statuses.contains("архив"));

    let visuals = app.scene().room(RoomId(1)).expect("room is drawn");
    assert_eq!(Some(visuals.polygon.fill), Rgba::parse("#B3808080"));
    assert_eq!(Some(visuals.number_label.color), Rgba::parse("#000000"));

    // the dangling status still shows up in the report
    let report = Report::build(app.data());
    assert!(report.by_status.iter().any(|s| s.status == "архив" && s.count == 1));
    assert!(app.legend().iter().all(|e| e.status != "архив"));

    let reloaded = Store::load(&path)?;
    assert_eq!(reloaded.data().floors["1"].rooms[1].status, "архив");
    Ok(())
}

#[test]
fn test_recolor_refreshes_current_floor() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("building_data.json");
    Store::with_data(&path, sample_document()).save()?;

    let mut app = App::new(Store::load(&path)?, Box::new(FileImageProbe));
    app.load_floor(1);
    app.add_status("занят", StatusColors::new("#B30000ff", "#ffffff"))?;

    let visuals = app.scene().room(RoomId(0)).expect("room is drawn");
    assert_eq!(Some(visuals.polygon.fill), Rgba::parse("#B30000ff"));
    assert_eq!(visuals.renter_label.text, "ИП Сидоров");
    assert_eq!(app.scene().room_at(Point::new(300.0, 50.0)), Some(RoomId(0)));
    Ok(())
}
