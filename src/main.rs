fn main() -> anyhow::Result<()> {
    sprite_ngin::startup()
}
