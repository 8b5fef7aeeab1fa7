fn main() {
    // ESP-IDF link/sysenv wiring is only needed for the device build.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
