//! Display names for detector classes

/// Russian display name for a detector class, or the class itself when unknown.
pub fn display_label(label: &str) -> &str {
    match label {
        "person" => "Человек",
        "car" => "Автомобиль",
        "truck" => "Грузовик",
        "bus" => "Автобус",
        "motorcycle" => "Мотоцикл",
        "bicycle" => "Велосипед",
        "backpack" => "Рюкзак",
        "umbrella" => "Зонт",
        "suitcase" => "Чемодан",
        "helmet" | "Hardhat" => "Каска",
        "Safety Vest" => "Сигнальный жилет",
        "Mask" => "Маска",
        "NO-Hardhat" => "Нет каски",
        "NO-Safety Vest" => "Нет сигнального жилета",
        "NO-Mask" => "Нет маски",
        other => other,
    }
}
