//! Integration tests for the alarm decision engine.

use catpoint_security::{
    create_shared_service, AlarmStatus, ArmingStatus, CameraImage, ChannelListener,
    FakeImageService, ImageError, ImageService, InMemoryRepository, ListenerHandle,
    RepositoryError, SecurityError, SecurityRepository, SecurityService, Sensor, SensorType,
    StatusEvent, StatusListener,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Repository that reports fixed statuses and records every write.
#[derive(Debug)]
struct StubRepository {
    alarm_status: AlarmStatus,
    arming_status: ArmingStatus,
    sensors: Vec<Sensor>,
    alarm_writes: Vec<AlarmStatus>,
    arming_writes: Vec<ArmingStatus>,
    sensor_writes: Vec<Sensor>,
    unavailable: bool,
}

impl StubRepository {
    fn new(alarm_status: AlarmStatus, arming_status: ArmingStatus) -> Self {
        Self {
            alarm_status,
            arming_status,
            sensors: Vec::new(),
            alarm_writes: Vec::new(),
            arming_writes: Vec::new(),
            sensor_writes: Vec::new(),
            unavailable: false,
        }
    }

    fn with_sensors(mut self, sensors: Vec<Sensor>) -> Self {
        self.sensors = sensors;
        self
    }

    fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            Err(RepositoryError::Unavailable("stub offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SecurityRepository for StubRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError> {
        Ok(self.alarm_status)
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError> {
        self.check()?;
        self.alarm_writes.push(status);
        Ok(())
    }

    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError> {
        Ok(self.arming_status)
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError> {
        self.check()?;
        self.arming_writes.push(status);
        Ok(())
    }

    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError> {
        Ok(self.sensors.clone())
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError> {
        self.check()?;
        self.sensors.push(sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        self.check()?;
        self.sensors.retain(|s| s != sensor);
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        self.check()?;
        self.sensor_writes.push(sensor.clone());
        if let Some(stored) = self.sensors.iter_mut().find(|s| *s == sensor) {
            *stored = sensor.clone();
        }
        Ok(())
    }
}

/// Image service that returns a preset verdict.
struct StubImageService {
    verdict: Result<bool, ImageError>,
    thresholds: Arc<Mutex<Vec<f32>>>,
}

impl StubImageService {
    fn answering(cat: bool) -> Self {
        Self {
            verdict: Ok(cat),
            thresholds: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing() -> Self {
        Self {
            verdict: Err(ImageError::Classifier("model not loaded".to_string())),
            thresholds: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ImageService for StubImageService {
    fn contains_cat(
        &self,
        _image: &CameraImage,
        confidence_threshold: f32,
    ) -> Result<bool, ImageError> {
        self.thresholds.lock().unwrap().push(confidence_threshold);
        self.verdict.clone()
    }
}

#[derive(Default)]
struct CountingListener {
    alarm: AtomicUsize,
    sensor: AtomicUsize,
    cat: AtomicUsize,
}

impl StatusListener for CountingListener {
    fn on_alarm_status_changed(&self, _status: AlarmStatus) {
        self.alarm.fetch_add(1, Ordering::SeqCst);
    }

    fn on_sensor_status_changed(&self) {
        self.sensor.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cat_detected(&self, _cat: bool) {
        self.cat.fetch_add(1, Ordering::SeqCst);
    }
}

fn door() -> Sensor {
    Sensor::new("Front Door", SensorType::Door)
}

fn frame() -> CameraImage {
    CameraImage::filled(4, 4, 128)
}

#[test]
fn test_armed_pending_activation_sets_alarm_once() {
    let repo = StubRepository::new(AlarmStatus::PendingAlarm, ArmingStatus::ArmedHome);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));
    let mut sensor = door();

    service
        .change_sensor_activation_status(&mut sensor, true)
        .unwrap();

    assert_eq!(service.repository().alarm_writes, vec![AlarmStatus::Alarm]);
    assert_eq!(service.repository().sensor_writes.len(), 1);
    assert!(service.repository().sensor_writes[0].active);
}

#[test]
fn test_armed_no_alarm_activation_sets_pending() {
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::ArmedAway);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));
    let mut sensor = door();

    service
        .change_sensor_activation_status(&mut sensor, true)
        .unwrap();

    assert_eq!(
        service.repository().alarm_writes,
        vec![AlarmStatus::PendingAlarm]
    );
}

#[test]
fn test_alarm_state_ignores_sensor_changes() {
    let repo = StubRepository::new(AlarmStatus::Alarm, ArmingStatus::ArmedAway);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));
    let mut sensor = door().with_active(true);

    service
        .change_sensor_activation_status(&mut sensor, false)
        .unwrap();
    service
        .change_sensor_activation_status(&mut sensor, true)
        .unwrap();

    assert!(service.repository().alarm_writes.is_empty());
    assert_eq!(service.repository().sensor_writes.len(), 2);
}

#[test]
fn test_disarmed_activation_never_changes_alarm() {
    for start in [
        AlarmStatus::NoAlarm,
        AlarmStatus::PendingAlarm,
        AlarmStatus::Alarm,
    ] {
        let sensors = vec![
            Sensor::new("A", SensorType::Door),
            Sensor::new("B", SensorType::Window).with_active(true),
            Sensor::new("C", SensorType::Motion),
        ];
        let repo = InMemoryRepository::with_state(start, ArmingStatus::Disarmed, sensors.clone());
        let mut service = SecurityService::new(repo, FakeImageService::new());

        for round in 0..3 {
            for sensor in &sensors {
                let mut sensor = sensor.clone();
                sensor.active = round % 2 == 1;
                service
                    .change_sensor_activation_status(&mut sensor, true)
                    .unwrap();
                assert_eq!(service.alarm_status().unwrap(), start);
            }
        }
    }
}

#[test]
fn test_arming_away_resets_all_sensors() {
    let sensors = vec![
        Sensor::new("Door", SensorType::Door).with_active(true),
        Sensor::new("Window", SensorType::Window).with_active(true),
        Sensor::new("Hall", SensorType::Motion).with_active(true),
    ];
    let repo = StubRepository::new(AlarmStatus::PendingAlarm, ArmingStatus::Disarmed)
        .with_sensors(sensors);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));

    service.set_arming_status(ArmingStatus::ArmedAway).unwrap();

    let repo = service.repository();
    assert_eq!(repo.sensor_writes.len(), 3);
    assert!(repo.sensor_writes.iter().all(|s| !s.active));
    assert!(repo.sensors.iter().all(|s| !s.active));
    assert_eq!(repo.arming_writes, vec![ArmingStatus::ArmedAway]);
    // The stub keeps reporting PendingAlarm, so every reset is judged from there.
    assert_eq!(repo.alarm_writes, vec![AlarmStatus::NoAlarm; 3]);
}

#[test]
fn test_arming_away_reset_escalates_quiet_alarm() {
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::Disarmed)
        .with_sensors(vec![door().with_active(true)]);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));

    service.set_arming_status(ArmingStatus::ArmedAway).unwrap();

    let repo = service.repository();
    assert_eq!(repo.alarm_writes, vec![AlarmStatus::Alarm]);
    assert!(!repo.sensor_writes[0].active);
}

#[test]
fn test_arming_reset_from_pending_clears_then_escalates() {
    let sensors = vec![
        Sensor::new("Door", SensorType::Door).with_active(true),
        Sensor::new("Hall", SensorType::Motion).with_active(true),
        Sensor::new("Window", SensorType::Window).with_active(true),
    ];
    let repo = InMemoryRepository::with_state(
        AlarmStatus::PendingAlarm,
        ArmingStatus::Disarmed,
        sensors,
    );
    let mut service = SecurityService::new(repo, FakeImageService::new());
    let (listener, events) = ChannelListener::new();
    service.add_status_listener(Arc::new(listener));

    service.set_arming_status(ArmingStatus::ArmedAway).unwrap();

    let alarm_changes: Vec<AlarmStatus> = events
        .try_iter()
        .filter_map(|event| match event {
            StatusEvent::AlarmStatusChanged(status) => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(alarm_changes, vec![AlarmStatus::NoAlarm, AlarmStatus::Alarm]);
    assert_eq!(service.alarm_status().unwrap(), AlarmStatus::Alarm);
}

#[test]
fn test_disarmed_alarm_sync_steps_down_once() {
    let repo = StubRepository::new(AlarmStatus::Alarm, ArmingStatus::Disarmed);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));

    service.sync_sensor_status(&door()).unwrap();

    assert_eq!(
        service.repository().alarm_writes,
        vec![AlarmStatus::PendingAlarm]
    );
    assert_eq!(service.repository().sensor_writes.len(), 1);
}

#[test]
fn test_sync_leaves_armed_alarm_alone() {
    let repo = StubRepository::new(AlarmStatus::Alarm, ArmingStatus::ArmedHome);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));

    service.sync_sensor_status(&door()).unwrap();

    assert!(service.repository().alarm_writes.is_empty());
    assert_eq!(service.repository().sensor_writes.len(), 1);
}

#[test]
fn test_disarming_always_clears() {
    for start in [
        AlarmStatus::NoAlarm,
        AlarmStatus::PendingAlarm,
        AlarmStatus::Alarm,
    ] {
        let repo = InMemoryRepository::with_state(start, ArmingStatus::ArmedHome, vec![door()]);
        let mut service = SecurityService::new(repo, FakeImageService::new());

        service.set_arming_status(ArmingStatus::Disarmed).unwrap();

        assert_eq!(service.alarm_status().unwrap(), AlarmStatus::NoAlarm);
    }
}

#[test]
fn test_arming_home_after_cat_sighting_alarms_from_any_state() {
    for start in [
        AlarmStatus::NoAlarm,
        AlarmStatus::PendingAlarm,
        AlarmStatus::Alarm,
    ] {
        let sensors = vec![door().with_active(true)];
        let repo = InMemoryRepository::with_state(start, ArmingStatus::Disarmed, sensors);
        let mut service = SecurityService::new(repo, StubImageService::answering(true));

        service.process_image(&frame()).unwrap();
        service.set_arming_status(ArmingStatus::ArmedHome).unwrap();

        assert_eq!(service.alarm_status().unwrap(), AlarmStatus::Alarm);
        assert!(service.sensors().unwrap().iter().all(|s| !s.active));
    }
}

#[test]
fn test_cat_detection_while_armed_home() {
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::ArmedHome);
    let mut service = SecurityService::new(repo, StubImageService::answering(true));

    service.process_image(&frame()).unwrap();

    assert_eq!(service.repository().alarm_writes, vec![AlarmStatus::Alarm]);
}

#[test]
fn test_no_cat_with_active_sensor_leaves_status() {
    let repo = StubRepository::new(AlarmStatus::PendingAlarm, ArmingStatus::ArmedHome)
        .with_sensors(vec![door(), door().with_active(true)]);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));

    service.process_image(&frame()).unwrap();

    assert!(service.repository().alarm_writes.is_empty());
}

#[test]
fn test_no_cat_with_quiet_sensors_clears() {
    let repo = StubRepository::new(AlarmStatus::Alarm, ArmingStatus::ArmedAway)
        .with_sensors(vec![door()]);
    let mut service = SecurityService::new(repo, StubImageService::answering(false));

    service.process_image(&frame()).unwrap();

    assert_eq!(service.repository().alarm_writes, vec![AlarmStatus::NoAlarm]);
}

#[test]
fn test_process_image_uses_configured_threshold() {
    let default_images = StubImageService::answering(false);
    let default_seen = Arc::clone(&default_images.thresholds);
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::Disarmed);
    let mut service = SecurityService::new(repo, default_images);
    service.process_image(&frame()).unwrap();

    let strict_images = StubImageService::answering(false);
    let strict_seen = Arc::clone(&strict_images.thresholds);
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::Disarmed);
    let mut strict = SecurityService::new(repo, strict_images).with_confidence_threshold(80.0);
    strict.process_image(&frame()).unwrap();

    assert_eq!(*default_seen.lock().unwrap(), vec![50.0]);
    assert_eq!(*strict_seen.lock().unwrap(), vec![80.0]);
}

#[test]
fn test_cat_event_broadcast_even_without_status_change() {
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::ArmedAway)
        .with_sensors(vec![door().with_active(true)]);
    let mut service = SecurityService::new(repo, StubImageService::answering(true));
    let (listener, events) = ChannelListener::new();
    service.add_status_listener(Arc::new(listener));

    service.process_image(&frame()).unwrap();

    assert_eq!(
        events.try_iter().collect::<Vec<_>>(),
        vec![StatusEvent::CatDetected(true)]
    );
}

#[test]
fn test_listener_registration_is_idempotent() {
    let repo = InMemoryRepository::with_state(
        AlarmStatus::NoAlarm,
        ArmingStatus::ArmedHome,
        Vec::new(),
    );
    let mut service = SecurityService::new(repo, StubImageService::answering(true));

    let counting = Arc::new(CountingListener::default());
    let handle: ListenerHandle = counting.clone();
    let stranger: ListenerHandle = Arc::new(CountingListener::default());

    service.add_status_listener(handle.clone());
    service.add_status_listener(handle.clone());
    service.remove_status_listener(&stranger);

    service.process_image(&frame()).unwrap();
    service.set_arming_status(ArmingStatus::Disarmed).unwrap();

    assert_eq!(counting.alarm.load(Ordering::SeqCst), 2);
    assert_eq!(counting.cat.load(Ordering::SeqCst), 1);
    assert_eq!(counting.sensor.load(Ordering::SeqCst), 1);

    service.remove_status_listener(&handle);
    service.set_arming_status(ArmingStatus::ArmedAway).unwrap();
    assert_eq!(counting.sensor.load(Ordering::SeqCst), 1);
}

#[test]
fn test_repository_failure_propagates() {
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::ArmedAway).unavailable();
    let mut service = SecurityService::new(repo, StubImageService::answering(false));
    let mut sensor = door();

    let err = service
        .change_sensor_activation_status(&mut sensor, true)
        .unwrap_err();

    assert_eq!(
        err,
        SecurityError::Repository(RepositoryError::Unavailable("stub offline".to_string()))
    );
}

#[test]
fn test_image_failure_propagates_and_keeps_flag() {
    let repo = StubRepository::new(AlarmStatus::NoAlarm, ArmingStatus::ArmedHome);
    let mut service = SecurityService::new(repo, StubImageService::failing());

    let err = service.process_image(&frame()).unwrap_err();

    assert!(matches!(err, SecurityError::Image(ImageError::Classifier(_))));
    assert!(!service.is_cat_detected());
    assert!(service.repository().alarm_writes.is_empty());
}

#[test]
fn test_shared_service_serializes_events() {
    let sensors: Vec<Sensor> = (0..4)
        .map(|i| Sensor::new(format!("Sensor {i}"), SensorType::Motion))
        .collect();
    let repo = InMemoryRepository::with_state(
        AlarmStatus::NoAlarm,
        ArmingStatus::ArmedAway,
        sensors.clone(),
    );
    let shared = create_shared_service(SecurityService::new(repo, FakeImageService::new()));

    let handles: Vec<_> = sensors
        .into_iter()
        .map(|sensor| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut sensor = sensor;
                for i in 0..50 {
                    let mut service = shared.lock().unwrap();
                    service
                        .change_sensor_activation_status(&mut sensor, i % 2 == 0)
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut service = shared.lock().unwrap();
    assert_eq!(service.sensors().unwrap().len(), 4);
    service.set_arming_status(ArmingStatus::Disarmed).unwrap();
    assert_eq!(service.alarm_status().unwrap(), AlarmStatus::NoAlarm);
}
